use mongodb::Database;
use bson::{Bson, Document, doc};
use crate::db::prelude::*;
use crate::model::lockout::{self, LockState, Lockout};
use crate::utils::context::ServiceContext;
use crate::utils::errors::{ErrorCode, WardenError};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};


pub async fn load(credential_id: &str, db: &Database) -> Result<Option<Lockout>, WardenError> {
    Ok(db.collection::<Lockout>(LOCKOUTS).find_one(doc!{ CREDENTIAL_ID: credential_id }, None).await?)
}

///
/// Is the credential currently locked out?
///
/// Clears an expired lockout-expiry as a side effect (guarded, so a live lock
/// is never cleared by accident) and reports how many attempts are left in
/// the current window when not locked.
///
pub async fn check_locked(ctx: &ServiceContext, credential_id: &str) -> Result<LockState, WardenError> {

    let policy = ctx.policy();
    let now = ctx.now();

    let lockout = match load(credential_id, ctx.db()).await? {
        Some(lockout) => lockout,
        None => return Ok(LockState::unlocked(policy.max_attempts)),
    };

    if let Some(remaining) = lockout.lock_remaining(now) {
        return Ok(LockState::locked(remaining))
    }

    // The expiry has passed - tidy it away so the row reads unlocked.
    if lockout.locked_until.is_some() {
        let filter = doc!{
            CREDENTIAL_ID: credential_id,
            LOCKED_UNTIL: { "$lte": bson::DateTime::from_chrono(now) }
        };

        ctx.db().collection::<Document>(LOCKOUTS)
            .update_one(filter, doc!{ "$unset": { LOCKED_UNTIL: "" } }, None)
            .await?;
    }

    let counted = match lockout.window_stale(now, policy) {
        true  => 0,
        false => lockout.failure_count,
    };

    Ok(LockState::unlocked(policy.max_attempts.saturating_sub(counted)))
}

///
/// Count a failed authentication attempt inside the sliding window.
///
/// Failures older than the attempts-window no longer count - the window
/// re-anchors at this failure instead. When the count reaches the policy
/// maximum the lockout expiry is stamped exactly once; a racing failure can
/// never extend it. Every step is a single guarded update so concurrent
/// requests cannot sneak extra attempts past the threshold.
///
pub async fn record_failure(ctx: &ServiceContext, credential_id: &str) -> Result<LockState, WardenError> {

    let policy = ctx.policy();
    let now = ctx.now();

    // If the oldest counted failure has aged out of the window, restart the
    // count at this failure. The first_failure guard means only one of any
    // concurrent requests performs the reset - the losers fall through to an
    // ordinary increment of the re-anchored window.
    if let Some(existing) = load(credential_id, ctx.db()).await? {
        if existing.window_stale(now, policy) {
            let stale_before = bson::DateTime::from_chrono(now - policy.attempts_window);
            let filter = doc!{
                CREDENTIAL_ID: credential_id,
                FIRST_FAILURE: { "$lt": stale_before }
            };
            let update = doc!{
                "$set": { FAILURE_COUNT: 1_i32, FIRST_FAILURE: bson::DateTime::from_chrono(now) },
                "$unset": { LOCKED_UNTIL: "" }
            };

            let result = ctx.db().collection::<Document>(LOCKOUTS).update_one(filter, update, None).await?;
            if result.modified_count == 1 {
                return Ok(LockState::unlocked(policy.max_attempts.saturating_sub(1)))
            }
        }
    }

    // Atomic increment-and-read - $setOnInsert anchors the window on the
    // very first failure for the credential.
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let update = doc!{
        "$inc": { FAILURE_COUNT: 1_i32 },
        "$setOnInsert": { FIRST_FAILURE: bson::DateTime::from_chrono(now) }
    };

    let lockout = ctx.db().collection::<Lockout>(LOCKOUTS)
        .find_one_and_update(doc!{ CREDENTIAL_ID: credential_id }, update, options)
        .await?
        .ok_or_else(|| ErrorCode::MongoDBError.with_msg("The lockout upsert returned no document"))?;

    if !lockout::should_lock(lockout.failure_count, policy) {
        return Ok(LockState::unlocked(policy.max_attempts.saturating_sub(lockout.failure_count)))
    }

    // Threshold reached - stamp the expiry, but never overwrite one a racing
    // request has already stamped.
    let filter = doc!{ CREDENTIAL_ID: credential_id, LOCKED_UNTIL: Bson::Null };
    let update = doc!{ "$set": { LOCKED_UNTIL: bson::DateTime::from_chrono(now + policy.lockout_duration) } };
    ctx.db().collection::<Document>(LOCKOUTS).update_one(filter, update, None).await?;

    // Report whatever expiry is authoritative now, ours or the winner's.
    let remaining = load(credential_id, ctx.db()).await?
        .and_then(|lockout| lockout.lock_remaining(now))
        .unwrap_or(policy.lockout_duration);

    Ok(LockState::locked(remaining))
}

///
/// A successful authentication resets the window to empty and clears any
/// lockout unconditionally.
///
pub async fn record_success(ctx: &ServiceContext, credential_id: &str) -> Result<(), WardenError> {
    ctx.db().collection::<Lockout>(LOCKOUTS).delete_one(doc!{ CREDENTIAL_ID: credential_id }, None).await?;
    Ok(())
}
