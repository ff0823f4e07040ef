use crate::state::MAX_SAFE_CHAIN_ID;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The chain id is not an integer in `1..=MAX_SAFE_CHAIN_ID`.
    #[error(
        "Invalid chainId {0} (expected an integer between 1 and {max}).",
        max = MAX_SAFE_CHAIN_ID
    )]
    InvalidChainId(String),
    #[error("Invalid account `{account}': {reason}.")]
    InvalidAccount { account: String, reason: String },
    #[error("Unknown connector `{0}'.")]
    UnknownConnector(String),
    #[error("No EIP-1193 provider was found in the browser.")]
    NoProvider,
    #[error("The provider returned no accounts.")]
    NoAccounts,
    #[error(transparent)]
    Provider(#[from] ProviderRpcError),
    #[error("Couldn't decode the provider response: {0}")]
    Decode(String),
}

/// Error codes defined by EIP-1193 plus the ones wallets commonly return
/// for the `wallet_*` methods (EIP-3085 and EIP-3326).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    #[error("The provider is disconnected from all chains.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    /// Returned by `wallet_switchEthereumChain` when the wallet does not
    /// know the chain yet: it needs to be added first.
    #[error("The requested chain has not been added to the wallet.")]
    UnrecognizedChain,
    #[error("Invalid method parameter(s).")]
    InvalidParams,
    #[error("Internal JSON-RPC error.")]
    InternalError,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error, serde::Deserialize)]
#[error("{code} {message}")]
pub struct ProviderRpcError {
    pub code: ProviderErrorCode,
    #[serde(default)]
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<ProviderErrorCode> for i64 {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::UserRejectedRequest => 4001,
            ProviderErrorCode::Unauthorized => 4100,
            ProviderErrorCode::UnsupportedMethod => 4200,
            ProviderErrorCode::Disconnected => 4900,
            ProviderErrorCode::ChainDisconnected => 4901,
            ProviderErrorCode::UnrecognizedChain => 4902,
            ProviderErrorCode::InvalidParams => -32602,
            ProviderErrorCode::InternalError => -32603,
            ProviderErrorCode::Unknown(code) => code,
        }
    }
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => ProviderErrorCode::UserRejectedRequest,
            4100 => ProviderErrorCode::Unauthorized,
            4200 => ProviderErrorCode::UnsupportedMethod,
            4900 => ProviderErrorCode::Disconnected,
            4901 => ProviderErrorCode::ChainDisconnected,
            4902 => ProviderErrorCode::UnrecognizedChain,
            -32602 => ProviderErrorCode::InvalidParams,
            -32603 => ProviderErrorCode::InternalError,
            unknown => ProviderErrorCode::Unknown(unknown),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from)
                    .map_err(|_| E::custom(format!("error code out of range: {v}")))
            }

            // javascript numbers reach us as floating points through
            // serde-wasm-bindgen
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v.abs() <= i64::MAX as f64 {
                    Ok(ProviderErrorCode::from(v as i64))
                } else {
                    Err(E::custom(format!("non integer error code: {v}")))
                }
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn provider_error_code_json() {
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4001 }).unwrap(),
            ProviderErrorCode::UserRejectedRequest
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4100 }).unwrap(),
            ProviderErrorCode::Unauthorized
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4200 }).unwrap(),
            ProviderErrorCode::UnsupportedMethod
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4900 }).unwrap(),
            ProviderErrorCode::Disconnected
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4901 }).unwrap(),
            ProviderErrorCode::ChainDisconnected
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4902 }).unwrap(),
            ProviderErrorCode::UnrecognizedChain
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { -32602 }).unwrap(),
            ProviderErrorCode::InvalidParams
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { -32603 }).unwrap(),
            ProviderErrorCode::InternalError
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 42 }).unwrap(),
            ProviderErrorCode::Unknown(42)
        );
        assert_eq!(
            serde_json::from_value::<ProviderErrorCode>(json! { 4001.0 }).unwrap(),
            ProviderErrorCode::UserRejectedRequest
        );
        assert!(serde_json::from_value::<ProviderErrorCode>(json! { 4001.5 }).is_err());
    }

    #[test]
    fn provider_error_code_integer() {
        for code in [4001, 4100, 4200, 4900, 4901, 4902, -32602, -32603, 1] {
            assert_eq!(i64::from(ProviderErrorCode::from(code)), code);
        }
    }

    #[test]
    fn provider_rpc_error_json() {
        assert_eq!(
            serde_json::from_value::<ProviderRpcError>(json! { {
                "code": 4001,
                "message": "User rejected the request.",
            }})
            .unwrap(),
            ProviderRpcError {
                code: ProviderErrorCode::UserRejectedRequest,
                message: "User rejected the request.".to_owned()
            }
        );

        assert_eq!(
            serde_json::from_value::<ProviderRpcError>(json! { {
                "code": 4902,
                "message": "Unrecognized chain ID \"0x89\".",
                "data": { "originalError": {} },
            }})
            .unwrap(),
            ProviderRpcError {
                code: ProviderErrorCode::UnrecognizedChain,
                message: "Unrecognized chain ID \"0x89\".".to_owned()
            }
        );

        assert_eq!(
            serde_json::from_value::<ProviderRpcError>(json! { { "code": 4900 } }).unwrap(),
            ProviderRpcError::new(ProviderErrorCode::Disconnected, "")
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            Error::InvalidChainId("0".to_owned()).to_string(),
            "Invalid chainId 0 (expected an integer between 1 and 4503599627370476)."
        );
        assert_eq!(
            Error::UnknownConnector("phantom".to_owned()).to_string(),
            "Unknown connector `phantom'."
        );
    }
}
