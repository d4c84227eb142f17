//! Variations: an independent rewrite of previously produced content.

use tracing::{info, instrument};

use contentcrew_shared::{ContentCrewError, Result};

use crate::pipeline::GenerationContext;

/// Instruction placed before the original text. The original follows after
/// a blank line, verbatim.
pub const VARIATION_INSTRUCTION: &str =
    "Produce a variation of the post below. Preserve its tone and length; change the wording.";

/// Build the variation prompt for `original`.
pub fn variation_prompt(original: &str) -> String {
    format!("{VARIATION_INSTRUCTION}\n\n{original}")
}

/// Issue exactly one generation call asking for a variation of `original`.
///
/// Each call is unrelated to any previous one; nothing is persisted.
#[instrument(skip_all, fields(original_len = original.len()))]
pub async fn vary(ctx: GenerationContext<'_>, original: &str) -> Result<String> {
    if original.trim().is_empty() {
        return Err(ContentCrewError::invalid_input(
            "cannot vary empty content",
        ));
    }

    let variation = ctx
        .service
        .generate(&variation_prompt(original), ctx.params)
        .await?;

    info!(output_len = variation.len(), "variation generated");
    Ok(variation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FnGenerator};

    /// Appends a suffix to whatever follows the instruction.
    fn suffixing() -> FnGenerator<impl Fn(&str) -> Result<String> + Send + Sync> {
        FnGenerator::new(|prompt: &str| {
            let original = prompt
                .strip_prefix(VARIATION_INSTRUCTION)
                .and_then(|rest| rest.strip_prefix("\n\n"))
                .unwrap_or(prompt);
            Ok(format!("{original} [v]"))
        })
    }

    #[tokio::test]
    async fn returns_original_plus_suffix() {
        let generator = suffixing();
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);

        let out = vary(ctx, "Ride electric.\n\nSave time.").await.unwrap();
        assert_eq!(out, "Ride electric.\n\nSave time. [v]");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn repeated_calls_are_independent() {
        let generator = suffixing();
        let params = testing::params();
        let ctx = GenerationContext::new(&generator, &params);

        let first = vary(ctx, "post").await.unwrap();
        let second = vary(ctx, "post").await.unwrap();
        assert_eq!(first, "post [v]");
        assert_eq!(second, "post [v]");

        // Both prompts are identical: no history accumulates between calls.
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
        assert_eq!(prompts[0], variation_prompt("post"));
    }

    #[tokio::test]
    async fn generation_failure_is_surfaced() {
        let generator = testing::failing();
        let params = testing::params();
        let err = vary(GenerationContext::new(&generator, &params), "post")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentCrewError::Generation(_)));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn empty_original_is_rejected_without_a_call() {
        let generator = testing::echo();
        let params = testing::params();
        let err = vary(GenerationContext::new(&generator, &params), "  \n")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentCrewError::InvalidInput { .. }));
        assert_eq!(generator.calls(), 0);
    }
}
