use crate::data::{ConfigurationError, SchedulingInput, SchedulingOutput};
use crate::solver::{self, SolverConfig};
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};

async fn solve_handler(
    Json(input): Json<SchedulingInput>,
) -> Result<Json<SchedulingOutput>, (StatusCode, Json<ConfigurationError>)> {
    match solver::solve(&input, &SolverConfig::default()) {
        Ok(output) => Ok(Json(output)),
        Err(error) => Err((StatusCode::UNPROCESSABLE_ENTITY, Json(error))),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/schedule/solve", post(solve_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
