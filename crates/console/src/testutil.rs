use crate::input::ScriptedLines;
use crate::term::Console;
use remote::testkit::{FakeBotServer, FakeBotState};
use remote::BotConfigClient;

pub type TestConsole = Console<ScriptedLines, Vec<u8>>;

pub struct Harness {
    pub server: FakeBotServer,
    pub client: BotConfigClient,
}

pub async fn harness(state: FakeBotState) -> Harness {
    let server = FakeBotServer::start(state).await;
    let client = BotConfigClient::new(server.url()).unwrap();
    Harness { server, client }
}

pub fn console(script: &[&str]) -> TestConsole {
    Console::new(ScriptedLines::new(script.iter().copied()), Vec::new())
}

pub fn output(console: &TestConsole) -> String {
    String::from_utf8_lossy(console.output()).to_string()
}
