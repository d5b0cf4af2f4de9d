//! Serve command - run the HTTP API until interrupted

use crate::config::Config;
use crate::error::ViewerResult;
use crate::server;

/// Execute the serve command
pub async fn execute(config: Config) -> ViewerResult<()> {
    server::serve(config).await
}
