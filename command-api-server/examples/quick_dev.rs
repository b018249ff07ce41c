use command_api::api::Command;
use serde_json::{json, Value};

const URL: &str = "http://localhost:5000";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let hc = httpc_test::new_client(URL)?;

    hc.do_get("/api/info").await?.print().await?;

    let response = hc.do_post("/api/commands", list_files()).await?;
    response.print().await?;
    let command: Command = serde_json::from_value(response.json_body()?)?;
    println!("Stored as {}", command.id());

    hc.do_get("/api/commands").await?.print().await?;

    Ok(())
}

fn list_files() -> Value {
    json!({
        "howTo": "List all files including hidden ones",
        "platform": "unix",
        "commandLine": "ls -la",
    })
}
