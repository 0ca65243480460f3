use mongodb::Database;
use bson::{Document, doc};
use crate::db::{mongo, prelude::*};
use crate::model::credential::Credential;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};


///
/// Store a brand new credential - the unique email index rejects duplicates.
///
pub async fn insert(credential: &Credential, db: &Database) -> Result<(), WardenError> {
    match db.collection::<Credential>(CREDENTIALS).insert_one(credential, None).await {
        Ok(_) => Ok(()),
        Err(err) => {
            match mongo::is_duplicate_err(&err) {
                true  => Err(ErrorCode::EmailAlreadyRegistered
                    .with_msg("That email address is already registered")),
                false => Err(WardenError::from(err)),
            }
        },
    }
}

///
/// Load the requested credential from the database.
///
pub async fn load(credential_id: &str, db: &Database) -> Result<Credential, WardenError> {

    let filter = doc!{ CREDENTIAL_ID: credential_id };

    match db.collection::<Credential>(CREDENTIALS).find_one(filter, None).await? {
        Some(credential) => Ok(credential),
        None => Err(ErrorCode::CredentialNotFound.with_msg("The credential requested does not exist"))
    }
}

///
/// Look a credential up by its (normalised) email address.
///
pub async fn find_by_email(email: &str, db: &Database) -> Result<Option<Credential>, WardenError> {
    Ok(db.collection::<Credential>(CREDENTIALS).find_one(doc!{ EMAIL: email }, None).await?)
}

///
/// Replace the stored password hash - the password-change flow.
///
pub async fn update_phc(ctx: &ServiceContext, credential_id: &str, phc: &str) -> Result<(), WardenError> {

    let filter = doc!{ CREDENTIAL_ID: credential_id };
    let update = doc!{ "$set": { PHC: phc } };

    let result = ctx.db().collection::<Document>(CREDENTIALS).update_one(filter, update, None).await?;

    match result.matched_count {
        0 => Err(ErrorCode::CredentialNotFound.with_msg("The credential requested does not exist")),
        _ => Ok(()),
    }
}
