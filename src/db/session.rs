use mongodb::Database;
use bson::{Document, doc};
use chrono::{DateTime, Utc};
use crate::db::prelude::*;
use crate::model::session::Session;
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};


///
/// Mint a session for the credential - last activity starts now, two-factor
/// unverified.
///
pub async fn create(ctx: &ServiceContext, credential_id: &str) -> Result<Session, WardenError> {
    let session = Session::new(credential_id, ctx.now());
    ctx.db().collection::<Session>(SESSIONS).insert_one(&session, None).await?;
    Ok(session)
}

pub async fn load(token: &str, db: &Database) -> Result<Option<Session>, WardenError> {
    Ok(db.collection::<Session>(SESSIONS).find_one(doc!{ TOKEN: token }, None).await?)
}

///
/// The activity check every authenticated request runs before its handler.
///
/// Bumps last_activity to now - unless the session has already sat idle for
/// the session timeout, in which case it is revoked and reported expired.
/// The last_activity cutoff guard makes the read-then-write atomic: an
/// expired session can never be resurrected by a racing touch.
///
pub async fn touch(ctx: &ServiceContext, token: &str) -> Result<Session, WardenError> {

    let now = ctx.now();

    let session = match load(token, ctx.db()).await? {
        Some(session) => session,
        None => return Err(ErrorCode::SessionNotFound.with_msg("The session token is not valid")),
    };

    // Idle too long - reap the row so the token can never be used again.
    if session.expired(now, ctx.policy()) {
        revoke(token, ctx.db()).await?;
        return Err(ErrorCode::SessionExpired.with_msg("The session has expired, sign in again"))
    }

    // Bump last_activity. The cutoff guard re-applies the expiry test inside
    // the update itself, so a racing request can never resurrect a session
    // this one just saw expire.
    let cutoff = now - ctx.policy().session_timeout;

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let filter = doc!{
        TOKEN: token,
        LAST_ACTIVITY: { "$gt": bson::DateTime::from_chrono(cutoff) }
    };

    let touched = ctx.db().collection::<Session>(SESSIONS)
        .find_one_and_update(filter, doc!{ "$set": { LAST_ACTIVITY: bson::DateTime::from_chrono(now) } }, options)
        .await?;

    match touched {
        Some(session) => Ok(session),
        None => Err(ErrorCode::SessionExpired.with_msg("The session has expired, sign in again")),
    }
}

///
/// Record a completed two-factor challenge on the session.
///
pub async fn mark_two_factor_verified(ctx: &ServiceContext, token: &str) -> Result<DateTime<Utc>, WardenError> {

    let now = ctx.now();
    let update = doc!{ "$set": { TWO_FACTOR_VERIFIED_AT: bson::DateTime::from_chrono(now) } };

    let result = ctx.db().collection::<Document>(SESSIONS).update_one(doc!{ TOKEN: token }, update, None).await?;

    match result.matched_count {
        0 => Err(ErrorCode::SessionNotFound.with_msg("The session token is not valid")),
        _ => Ok(now),
    }
}

pub async fn revoke(token: &str, db: &Database) -> Result<(), WardenError> {
    db.collection::<Session>(SESSIONS).delete_one(doc!{ TOKEN: token }, None).await?;
    Ok(())
}

///
/// Revoke every session the credential owns - password change or an explicit
/// "log out everywhere". Returns how many were dropped.
///
pub async fn revoke_all(credential_id: &str, db: &Database) -> Result<u64, WardenError> {
    let result = db.collection::<Session>(SESSIONS).delete_many(doc!{ CREDENTIAL_ID: credential_id }, None).await?;
    Ok(result.deleted_count)
}

///
/// Drop sessions that have sat idle past the timeout. Expiry is enforced
/// lazily by touch on every request - this sweep is hygiene, keeping dead
/// rows from accumulating.
///
pub async fn purge_expired(ctx: &ServiceContext) -> Result<u64, WardenError> {

    let cutoff = ctx.now() - ctx.policy().session_timeout;
    let filter = doc!{ LAST_ACTIVITY: { "$lte": bson::DateTime::from_chrono(cutoff) } };

    let result = ctx.db().collection::<Session>(SESSIONS).delete_many(filter, None).await?;
    Ok(result.deleted_count)
}
