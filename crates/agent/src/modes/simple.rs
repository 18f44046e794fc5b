//! Single-shot review: title, description and diff in one prompt.

use prbot_core::change::ReviewContext;
use prbot_core::error::Error;
use tracing::info;

use super::SingleShot;
use crate::diff::{DIFF_LIMIT, build_diff};

pub const NO_DESCRIPTION: &str = "[no description provided]";

pub struct SimpleReview {
    session: SingleShot,
}

impl SimpleReview {
    pub fn new(session: SingleShot) -> Self {
        Self { session }
    }

    pub fn prompt(ctx: &ReviewContext) -> String {
        format!(
            "\nTitle: {}\nDescription: {}\n\nHere is the diff:\n\n{}\n",
            ctx.title,
            ctx.description().unwrap_or(NO_DESCRIPTION),
            build_diff(&ctx.changes, DIFF_LIMIT),
        )
    }

    pub async fn run(&self, ctx: &ReviewContext) -> Result<String, Error> {
        info!(files = ctx.changes.len(), "Running simple review");
        self.session.ask(&Self::prompt(ctx)).await
    }
}
