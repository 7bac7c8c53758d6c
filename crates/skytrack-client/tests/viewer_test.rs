use skytrack_client::{run_viewer, Config, ViewerCommand};
use skytrack_core::ViewSettings;
use std::time::Duration;
use tokio::sync::mpsc;

fn offline_config() -> Config {
    Config {
        feed_url: "ws://127.0.0.1:1/stream".to_string(),
        view: ViewSettings::default(),
    }
}

#[tokio::test]
async fn viewer_stops_on_quit() {
    let (tx, rx) = mpsc::channel(8);
    tx.send(ViewerCommand::Select("S1".to_string())).await.unwrap();
    tx.send(ViewerCommand::Quit).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), run_viewer(offline_config(), rx)).await;
    assert!(matches!(result, Ok(Ok(()))));
}

#[tokio::test]
async fn viewer_stops_when_commands_close() {
    let (tx, rx) = mpsc::channel::<ViewerCommand>(1);
    drop(tx);

    let result = tokio::time::timeout(Duration::from_secs(5), run_viewer(offline_config(), rx)).await;
    assert!(matches!(result, Ok(Ok(()))));
}
