use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModemError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("modem not initialized")]
    NotInitialized,

    #[error("invalid KISS frame")]
    InvalidKissFrame,

    #[error("encode buffer overflow: capacity {0}")]
    EncodeOverflow(usize),

    #[error("flag or abort sequence inside stuffed payload")]
    InvalidStuffing,

    #[error("transmitter busy")]
    TransmitBusy,
}

pub type Result<T> = std::result::Result<T, ModemError>;
