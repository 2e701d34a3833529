#[derive(Debug, Clone)]
pub enum GameEngineCommand {
    StartCountdown,
    RegisterClick,
    EndRound,
    Reset,
}
