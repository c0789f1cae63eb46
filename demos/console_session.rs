use std::error::Error;

use opsconsole_sdk::session::client::SessionClient;
use opsconsole_sdk::session::console::ConsoleSession;
use opsconsole_sdk::task_api::TaskApiClient;

fn main() -> Result<(), Box<dyn Error>> {
    let host = std::env::args().nth(1).unwrap_or_else(|| "localhost:8080".to_string());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let client = SessionClient::new().with_endpoint(format!("ws://{host}/ws"));
        let task_api = TaskApiClient::new()?.with_base_url(format!("http://{host}"));
        let mut session = ConsoleSession::connect(&client, task_api);

        session.send("disk pressure alert on node-3").await;

        while let Some(entry) = session.recv().await {
            println!("[{}] {}", entry.sender, entry.text);
        }

        Ok::<(), Box<dyn Error>>(())
    })
}
