//! Built-in planner → writer → editor pipelines.
//!
//! Stage ids are `plan`, `write`, `edit`; each downstream role reads the
//! previous stage's output through the placeholder of the same name.

use std::sync::Arc;

use contentcrew_shared::{PresetName, Result};

use crate::crew::{Pipeline, Role, Stage};

/// Pipeline for a named preset.
pub fn pipeline_for(preset: PresetName) -> Result<Pipeline> {
    match preset {
        PresetName::Blog => blog_pipeline(),
        PresetName::Social => social_pipeline(),
    }
}

/// Long-form blog post. Needs only `{topic}`.
pub fn blog_pipeline() -> Result<Pipeline> {
    let planner = Arc::new(Role::new(
        "Content Planner",
        "Plan engaging and factually accurate content about {topic}.",
        "You are planning a blog article about {topic}. You collect information \
         that helps the audience learn something and make informed decisions. \
         Your work is the basis for the Content Writer.",
    ));
    let writer = Arc::new(Role::new(
        "Content Writer",
        "Write an engaging, well-structured blog post about {topic}.",
        "You are a writer working from the content plan below. Stay aligned \
         with SEO practice and the brand voice.\n\nContent plan:\n{plan}",
    ));
    let editor = Arc::new(Role::new(
        "Editor",
        "Edit the blog post so it matches the organization's writing style.",
        "You receive the post below from the Content Writer. Follow journalistic \
         best practices, give balanced viewpoints, and avoid controversial \
         claims.\n\nDraft:\n{write}",
    ));

    Pipeline::chain(
        "blog",
        vec![
            Stage::new(
                "plan",
                planner,
                "1. Prioritize recent trends, key players, and relevant news about {topic}.\n\
                 2. Identify the target audience, their interests and pain points.\n\
                 3. Build a detailed outline with an introduction, key points, and a call to action.\n\
                 4. Include SEO keywords and relevant sources.\n\
                 5. Cover every important aspect of the topic.",
                "A content plan with outline, audience analysis, SEO keywords, and resources.",
            ),
            Stage::new(
                "write",
                writer,
                "1. Use the content plan to write a compelling post about {topic}.\n\
                 2. Work the SEO keywords in naturally.\n\
                 3. Give sections engaging headings.\n\
                 4. Open with a strong introduction, inform in the body, close with a summary.\n\
                 5. Proofread for grammar and brand voice.\n\
                 6. Give each section 2 or 3 paragraphs.\n\
                 7. Write at least 1000 words.",
                "A polished blog post in markdown, ready to publish.",
            ),
            Stage::new(
                "edit",
                editor,
                "Proofread the post for grammatical errors and alignment with the brand voice.",
                "A reviewed, error-free blog post in markdown, ready to publish.",
            ),
        ],
    )
}

/// Short social-media post grounded in web search. Needs `{topic}`,
/// `{web_insights}`, and `{framework}`.
pub fn social_pipeline() -> Result<Pipeline> {
    let planner = Arc::new(Role::new(
        "Content Planner",
        "Plan engaging and accurate social-media content about {topic}.",
        "You are planning a social-media post about {topic}. Ground your plan \
         in these web insights:\n{web_insights}\n\
         Your work is the basis for the Content Creator.",
    ));
    let creator = Arc::new(Role::new(
        "Content Creator",
        "Create an engaging, well-structured social-media post about {topic}.",
        "You are a content creator working from the plan below. Follow \
         copywriting best practice and the brand voice.\n\nContent plan:\n{plan}",
    ));
    let editor = Arc::new(Role::new(
        "Editor",
        "Edit the generated post to match the brand's voice and style.",
        "You receive the social-media post below. Review it for good practice, \
         tone of voice, and errors.\n\nDraft:\n{write}",
    ));

    Pipeline::chain(
        "social",
        vec![
            Stage::new(
                "plan",
                planner,
                "1. Prioritize recent trends, key players, and relevant news about {topic}.\n\
                 2. Use these web insights:\n{web_insights}\n\
                 3. Identify the target audience and their pain points.\n\
                 4. Outline a hook, a body, and a call to action.\n\
                 5. Include relevant hashtags and keywords.\n\
                 6. Cover everything a social-media post needs.",
                "A content plan with outline, audience, hashtags, and call to action.",
            ),
            Stage::new(
                "write",
                creator,
                "1. Use the content plan to create a social-media post about {topic}.\n\
                 2. Structure it with the {framework} copywriting framework.\n\
                 3. Work the hashtags in naturally.\n\
                 4. Open with a hook, inform in the body, end with a call to action.\n\
                 5. Keep it concise (up to 300 characters) and captivating.\n\
                 6. Check alignment with the brand voice.",
                "Social-media post text, ready to publish.",
            ),
            Stage::new(
                "edit",
                editor,
                "Proofread the post for grammatical errors and align it with the brand voice.",
                "A reviewed, error-free social-media post.",
            ),
        ],
    )
}
