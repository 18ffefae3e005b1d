use std::sync::Arc;

use watchparty_collab::{Collab, MemoryStore};
use watchparty_server::{logging::init_logger, run_server};

#[tokio::main]
async fn main() {
    init_logger();

    let collab = Arc::new(Collab::new(MemoryStore::new()));

    run_server(collab).await
}
