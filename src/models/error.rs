use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("action not allowed during the {0} phase")]
    WrongPhase(String),
    #[error("only the host can do that")]
    Unauthorized,
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),
    #[error("the name \"{0}\" is already taken")]
    NameConflict(String),
    #[error("the doctor cannot heal the same player two nights in a row")]
    RepeatTarget,
    #[error("invalid role configuration: {0}")]
    ConfigInvalid(String),
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
    #[error("action not allowed: {0}")]
    ActionNotAllowed(&'static str),
    #[error("night of round {0} has already been resolved")]
    AlreadyResolved(u32),
    #[error("could not allocate a unique session code")]
    CodeSpaceExhausted,
}

pub type GameResult<T> = Result<T, GameError>;
