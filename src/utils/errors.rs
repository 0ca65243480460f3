use tonic::{Code, Status};
use tokio::task::JoinError;
use bson::document::ValueAccessError;

#[cfg(feature = "kafka")]
use rdkafka::{error::KafkaError, message::OwnedMessage};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorCode {
    TonicStartError                 = 0400,
    HashThreadingIssue              = 0401,
    UnableToReadCredentials         = 0500,
    MongoDBError                    = 0503,
    InvalidBSON                     = 0504,
    InvalidJSON                     = 0505,
    KafkaSendError                  = 0506,
    BSONFieldNotFound               = 0507,
    HashingError                    = 0509,
    InvalidPHCFormat                = 0510,
    EncryptionFailed                = 0511,
    DecryptionFailed                = 0512,
    InvalidMasterKey                = 0513,
    IOError                         = 0514,
    EmailAlreadyRegistered          = 2000,
    CredentialNotFound              = 2001,
    InvalidCredentials              = 2002,
    AccountLocked                   = 2003,
    TwoFactorAlreadyEnabled         = 2100,
    TwoFactorNotEnabled             = 2101,
    TwoFactorSetupExpired           = 2102,
    InvalidTwoFactorCode            = 2103,
    MalformedSecret                 = 2104,
    SessionNotFound                 = 2200,
    SessionExpired                  = 2201,
    TwoFactorRequired               = 2202,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> WardenError {
        WardenError::new(*self, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WardenError {
    error_code: ErrorCode,
    message: String,
}

impl WardenError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        WardenError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<tonic::transport::Error> for WardenError {
    fn from(error: tonic::transport::Error) -> Self {
        ErrorCode::TonicStartError.with_msg(&format!("Failed to start gRPC server: {}", error))
    }
}

impl From<argon2::password_hash::Error> for WardenError {
    fn from(error: argon2::password_hash::Error) -> Self {
        ErrorCode::HashingError.with_msg(&format!("Unable to hash password: {}", error))
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(error: serde_json::Error) -> Self {
        ErrorCode::InvalidJSON.with_msg(&format!("Unable to convert to json: {}", error))
    }
}

impl From<mongodb::error::Error> for WardenError {
    fn from(error: mongodb::error::Error) -> Self {
        ErrorCode::MongoDBError.with_msg(&format!("MongoDB error: {}", error))
    }
}

impl From<ValueAccessError> for WardenError {
    fn from(error: ValueAccessError) -> Self {
        ErrorCode::BSONFieldNotFound.with_msg(&format!("Unable to read BSON: {}", error))
    }
}

impl From<bson::ser::Error> for WardenError {
    fn from(error: bson::ser::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to serialise BSON: {}", error))
    }
}

impl From<bson::de::Error> for WardenError {
    fn from(error: bson::de::Error) -> Self {
        ErrorCode::InvalidBSON.with_msg(&format!("Unable to deserialise BSON: {}", error))
    }
}

impl From<JoinError> for WardenError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

#[cfg(feature = "kafka")]
impl From<(KafkaError, OwnedMessage)> for WardenError {
    fn from((error, message): (KafkaError, OwnedMessage)) -> Self {
        ErrorCode::KafkaSendError.with_msg(&format!("Kafka error: {}, message: {:?}", error, message))
    }
}

///
/// Convert our internal error into a gRPC status response.
///
/// This is the only place a domain error becomes a transport error. The gRPC
/// codes approximate the HTTP semantics the callers render (Unauthenticated
/// = 401, ResourceExhausted = 429, InvalidArgument = 422).
///
impl From<WardenError> for Status {
    fn from(error: WardenError) -> Self {
        use ErrorCode::*;

        let code = match &error.error_code {
            BSONFieldNotFound       |
            DecryptionFailed        |
            EncryptionFailed        |
            HashThreadingIssue      |
            HashingError            |
            IOError                 |
            InvalidBSON             |
            InvalidJSON             |
            InvalidMasterKey        |
            InvalidPHCFormat        |
            KafkaSendError          |
            MongoDBError            |
            TonicStartError         |
            UnableToReadCredentials => Code::Internal,

            EmailAlreadyRegistered => Code::AlreadyExists,

            InvalidTwoFactorCode |
            MalformedSecret => Code::InvalidArgument,

            TwoFactorAlreadyEnabled |
            TwoFactorNotEnabled     |
            TwoFactorSetupExpired => Code::FailedPrecondition,

            AccountLocked => Code::ResourceExhausted,

            TwoFactorRequired => Code::PermissionDenied,

            CredentialNotFound |
            InvalidCredentials |
            SessionExpired     |
            SessionNotFound => Code::Unauthenticated,
        };

        Status::with_details(code, error.message, format!("{}", error.error_code as u32).into())
    }
}
