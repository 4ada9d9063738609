use thiserror::Error;

/// Errors surfaced by any `ChainRpc` implementation (HTTP or in-process).
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node
    #[error("rpc error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("node has no unlocked accounts")]
    NoAccounts,
}

impl From<jsonrpsee::core::ClientError> for RpcError {
    fn from(err: jsonrpsee::core::ClientError) -> Self {
        match err {
            jsonrpsee::core::ClientError::Call(obj) => RpcError::Server {
                code: obj.code(),
                message: obj.message().to_string(),
            },
            jsonrpsee::core::ClientError::ParseError(e) => RpcError::Decode(e.to_string()),
            other => RpcError::Transport(other.to_string()),
        }
    }
}

/// Convenience alias
pub type RpcResult<T> = std::result::Result<T, RpcError>;
