#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Engine(#[from] tagstore_engine::EngineError),

    #[error("{0}")]
    Serve(#[from] tagstore_api_server::ServeError),

    #[error("api task: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),
}
