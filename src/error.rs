#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("payment amount must be greater than zero")]
    ZeroAmount,
    #[error("payee must not be empty")]
    EmptyPayee,
    #[error("cargo count must be greater than zero")]
    ZeroCount,
    #[error("item name must not be empty")]
    EmptyItem,
    #[error("recipient must not be empty")]
    EmptyRecipient,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database operation failed")]
    Db(#[from] sled::Error),
    #[error("stored document could not be decoded")]
    Decode(#[from] minicbor::decode::Error),
    #[error("document could not be encoded: {0}")]
    Encode(String),
}
