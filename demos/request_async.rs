use std::{sync::Arc, time::Duration};

use metlog_context::{Client, FutureExt, THREADLOCAL_FIELD, get_context, sender::LogSender, thread_context};

fn try_init_logger() -> Result<(), Box<dyn std::error::Error>> {
    let level = log::LevelFilter::Info;

    structured_logger::Builder::with_level(level.as_str())
        .with_target_writer("*", structured_logger::json::new_writer(std::io::stdout()))
        .try_init()?;

    Ok(())
}

async fn load_profile(user: &str) -> usize {
    tokio::time::sleep(Duration::from_millis(50)).await;
    get_context().insert("profile_loaded", true);
    user.len()
}

async fn handle(client: Arc<Client>, user: &'static str) -> metlog_context::Result<usize> {
    let session = thread_context(|mapping| {
        let message = client
            .message("job")
            .with_payload(format!("Processed {user}"))
            .with_field(THREADLOCAL_FIELD, mapping.to_json()?);
        client.send(&message)
    });
    session.mapping().insert("user", user);

    tokio::task::yield_now().await;
    let size = load_profile(user).await;
    get_context().insert("size", size);

    session.exit()?;
    Ok(size)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    try_init_logger()?;

    let client = Arc::new(Client::new(Arc::new(LogSender), "request_async"));
    log::info!("Initialized client");

    let tasks = ["alice", "bob", "charlie"]
        .into_iter()
        .map(|user| tokio::spawn(handle(client.clone(), user).in_new_execution_context()))
        .collect::<Vec<_>>();

    for task in tasks {
        let size = task.await??;
        log::info!("Job finished with size {size}");
    }

    Ok(())
}
