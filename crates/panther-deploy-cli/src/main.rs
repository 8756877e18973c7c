// panther-deploy entry point

use panther_deploy_cli::router::CommandRouter;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        error!("{}", e.user_message());
        std::process::exit(1);
    }
}
