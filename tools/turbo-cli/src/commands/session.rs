//! Session commands.

use anyhow::Result;
use serde_json::json;
use turbo_commerce::session::SessionRecord;
use turbo_commerce::UserId;

use super::{SessionArgs, SessionCommand};
use crate::context::Context;

/// Run the session command.
pub async fn run(args: SessionArgs, ctx: &Context) -> Result<()> {
    let mut state = ctx.open_state().await?;

    match args.command {
        SessionCommand::SignIn {
            user_id,
            session_only,
        } => {
            let record = match user_id {
                Some(id) => SessionRecord::for_user(UserId::parse(id).map_err(|e| state.report(e))?),
                None => SessionRecord::guest(),
            };
            let remember_me = ctx.config.storage.remember_me && !session_only;
            let tier = state.sign_in(&record, remember_me)?;
            ctx.output
                .success(&format!("Signed in ({} storage)", tier.as_str()));
        }
        SessionCommand::SignOut => {
            state.sign_out()?;
            ctx.output.success("Signed out");
        }
        SessionCommand::Show => {}
    }

    let active = state.session().active_tier()?;
    let user_id = state.user_id();

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "active": active.is_some(),
            "tier": active.map(|t| t.as_str()),
            "user_id": user_id.as_ref().map(|id| id.as_str()),
            "cart_count": state.cart_count(),
            "wishlist_count": state.wishlist_count(),
        }));
        return Ok(());
    }

    ctx.output.header("Session");
    match active {
        Some(tier) => {
            ctx.output.kv("tier", tier.as_str());
            ctx.output.kv(
                "user",
                user_id.as_ref().map(|id| id.as_str()).unwrap_or("guest"),
            );
            ctx.output.kv("cart items", &state.cart_count().to_string());
            ctx.output.kv("wishlist", &state.wishlist_count().to_string());
        }
        None => ctx.output.info("No active session"),
    }

    Ok(())
}
