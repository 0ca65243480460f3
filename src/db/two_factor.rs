use mongodb::Database;
use bson::{Bson, Document, doc};
use crate::db::{mongo, prelude::*};
use crate::model::two_factor::{RecoveryCode, TwoFactor};
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};


pub async fn load(credential_id: &str, db: &Database) -> Result<Option<TwoFactor>, WardenError> {
    Ok(db.collection::<TwoFactor>(TWO_FACTOR).find_one(doc!{ CREDENTIAL_ID: credential_id }, None).await?)
}

///
/// Begin (or restart) enrolment with a fresh pending secret and recovery set.
///
/// The confirmed_on guard plus the unique credential_id index make this
/// atomic: a pending enrolment is simply replaced, but if a confirmed one
/// exists the upsert collides with the index and the caller gets
/// TwoFactorAlreadyEnabled.
///
pub async fn start_enrolment(ctx: &ServiceContext, enrolment: &TwoFactor) -> Result<(), WardenError> {

    let filter = doc!{
        CREDENTIAL_ID: &enrolment.credential_id,
        CONFIRMED_ON: Bson::Null
    };

    let update = doc!{
        "$set": {
            SECRET: &enrolment.secret,
            RECOVERY_CODES: bson::to_bson(&enrolment.recovery_codes)?
        }
    };

    match ctx.db().collection::<Document>(TWO_FACTOR).update_one(filter, update, mongo::upsert()).await {
        Ok(_) => Ok(()),
        Err(err) => {
            match mongo::is_duplicate_err(&err) {
                true  => Err(ErrorCode::TwoFactorAlreadyEnabled
                    .with_msg("Two-factor authentication is already enabled, disable it first")),
                false => Err(WardenError::from(err)),
            }
        },
    }
}

///
/// Promote the pending secret to confirmed. Returns false when there was no
/// pending enrolment to promote (it expired, was disabled, or a racing
/// request got there first).
///
pub async fn confirm(ctx: &ServiceContext, credential_id: &str) -> Result<bool, WardenError> {

    let filter = doc!{ CREDENTIAL_ID: credential_id, CONFIRMED_ON: Bson::Null };
    let update = doc!{ "$set": { CONFIRMED_ON: bson::DateTime::from_chrono(ctx.now()) } };

    let result = ctx.db().collection::<Document>(TWO_FACTOR).update_one(filter, update, None).await?;
    Ok(result.modified_count == 1)
}

///
/// Atomic check-and-mark of a single recovery code. The positional
/// consumed-false guard means that of any concurrent requests presenting the
/// same code, exactly one consumes it - the rest see false.
///
pub async fn consume_code(ctx: &ServiceContext, credential_id: &str, index: usize) -> Result<bool, WardenError> {

    let mut filter = doc!{ CREDENTIAL_ID: credential_id };
    filter.insert(format!("{}.{}.{}", RECOVERY_CODES, index, CONSUMED), false);

    let mut fields = Document::new();
    fields.insert(format!("{}.{}.{}", RECOVERY_CODES, index, CONSUMED), true);

    let result = ctx.db().collection::<Document>(TWO_FACTOR).update_one(filter, doc!{ "$set": fields }, None).await?;
    Ok(result.modified_count == 1)
}

///
/// Swap in a freshly generated recovery set, invalidating every previous
/// code. Only a confirmed enrolment can be regenerated.
///
pub async fn replace_codes(ctx: &ServiceContext, credential_id: &str, codes: &[RecoveryCode]) -> Result<(), WardenError> {

    let filter = doc!{ CREDENTIAL_ID: credential_id, CONFIRMED_ON: { "$ne": Bson::Null } };
    let update = doc!{ "$set": { RECOVERY_CODES: bson::to_bson(codes)? } };

    let result = ctx.db().collection::<Document>(TWO_FACTOR).update_one(filter, update, None).await?;

    match result.matched_count {
        0 => Err(ErrorCode::TwoFactorNotEnabled
            .with_msg("Two-factor authentication is not enabled for this credential")),
        _ => Ok(()),
    }
}

///
/// Discard the secret and every recovery code. Idempotent - disabling an
/// enrolment that doesn't exist is fine.
///
pub async fn disable(ctx: &ServiceContext, credential_id: &str) -> Result<(), WardenError> {
    ctx.db().collection::<TwoFactor>(TWO_FACTOR).delete_one(doc!{ CREDENTIAL_ID: credential_id }, None).await?;
    Ok(())
}
