//! Prompt assembly for angle, content and image generation.
//!
//! Prompts are pure functions of their input, so the same brief always produces the same prompt.

use super::{Brief, ContentLength, ContentRequest, ContentType};

pub const ANGLE_SYSTEM_PROMPT: &str =
    "You are an expert marketing strategist. You output structured content angles. Always return valid JSON.";

pub const CONTENT_SYSTEM_PROMPT: &str = "You are an expert copywriter. Generate polished, ready-to-use marketing content. \
Never include meta explanations, instructions, or notes about the content. Output only the finished content.";

/// Push `label: value` on its own line, skipping absent or blank values.
fn push_field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
}

/// User prompt asking for `count` angles for a brief, as a JSON object with an `angles` array.
pub fn angle_prompt(brief: &Brief, count: usize) -> String {
    let mut context = String::new();
    push_field(&mut context, "Topic", Some(&brief.topic));
    push_field(&mut context, "Audience", Some(brief.audience.as_deref().unwrap_or("General")));
    push_field(&mut context, "Channel", Some(&brief.channel));
    push_field(&mut context, "Tone", Some(&brief.tone));
    push_field(&mut context, "Goal", Some(&brief.goal));
    push_field(&mut context, "Competitor URL", brief.competitor_url.as_deref());
    push_field(&mut context, "Competitor Copy", brief.competitor_copy.as_deref());

    format!(
        "Generate {count} unique marketing content angles for:

{context}
Each angle must include:
- Angle Name
- Hook
- Headline
- 2-3 sentence explanation
- Suggested visual theme

Return a JSON object with a single key \"angles\" containing an array of objects. \
Each object should have these keys: angleName, hook, headline, explanation, visualSuggestion.
The response must be valid JSON.
"
    )
}

/// Length guidance shared by every content type.
pub fn length_guidance(length: ContentLength) -> &'static str {
    match length {
        ContentLength::Short => {
            "Keep it concise and punchy. For LinkedIn: 2-3 short paragraphs. For Blog: 300-500 words. \
For Email: Brief, scannable. For Ad Copy: Very tight. For Social: 1-2 sentences."
        }
        ContentLength::Medium => {
            "Standard length. For LinkedIn: 4-6 paragraphs. For Blog: 800-1200 words. \
For Email: Moderate length. For Ad Copy: Standard format. For Social: 2-4 sentences."
        }
        ContentLength::Long => {
            "Comprehensive and detailed. For LinkedIn: 7+ paragraphs. For Blog: 1500+ words with multiple sections. \
For Email: Detailed explanation. For Ad Copy: Extended format. For Social: 4+ sentences."
        }
    }
}

fn content_context(req: &ContentRequest) -> String {
    let length = req.length.unwrap_or_default();
    let mut context = String::new();
    push_field(&mut context, "Angle Name", Some(&req.angle_name));
    push_field(&mut context, "Hook", Some(&req.hook));
    push_field(&mut context, "Headline", Some(&req.headline));
    push_field(&mut context, "Explanation", Some(&req.explanation));
    push_field(&mut context, "Visual Suggestion", req.visual_suggestion.as_deref());
    push_field(&mut context, "Channel", req.channel.as_deref());
    push_field(&mut context, "Tone", req.tone.as_deref());
    push_field(&mut context, "Goal", req.goal.as_deref());
    push_field(&mut context, "Audience", req.audience.as_deref());
    push_field(&mut context, "Source Topic", req.source_topic.as_deref());
    push_field(&mut context, "Custom CTA", req.custom_cta.as_deref());
    push_field(&mut context, "Length", Some(length.as_str()));
    context.push_str(length_guidance(length));
    context.push('\n');
    context
}

/// User prompt for expanding an angle into one of the supported content types.
pub fn content_prompt(req: &ContentRequest) -> String {
    let context = content_context(req);
    let tone = req.tone.as_deref().unwrap_or("Professional");
    let length = req.length.unwrap_or_default().as_str();

    match req.content_type {
        ContentType::LinkedInPost => format!(
            "Write a LinkedIn post based on this marketing angle.

{context}
Requirements:
- Start with the hook in the first 1-2 lines to grab attention
- Use short, punchy lines (break up paragraphs for readability)
- Write from a clear point of view (POV-driven)
- End with a soft CTA or engaging question
- Match the specified tone: {tone}
- Aim for the {length} length guideline
- Do NOT include meta explanations or instructions
- Output ONLY the finished LinkedIn post content

Return the complete LinkedIn post ready to publish."
        ),
        ContentType::BlogPost => format!(
            "Write a blog post based on this marketing angle.

{context}
Requirements:
- Start with an introduction that frames the problem or opportunity
- Structure the body with clear subheadings (use ## for main sections, ### for subsections)
- Express the angle clearly throughout the post
- End with a strong conclusion and clear CTA
- Match the specified tone: {tone}
- Aim for the {length} length guideline
- Do NOT include meta explanations or instructions
- Output ONLY the finished blog post content with markdown formatting

Return the complete blog post ready to publish."
        ),
        ContentType::Email => format!(
            "Write an email based on this marketing angle.

{context}
Requirements:
- MUST include a subject line at the top (format: Subject: [subject line])
- Include an optional preview line after the subject (format: Preview: [preview text])
- Write in a conversational tone
- Use short paragraphs for readability
- Place the CTA at the end
- Match the specified tone: {tone}
- Aim for the {length} length guideline
- Do NOT include meta explanations or instructions
- Output ONLY the finished email content

Format:
Subject: [subject line]
Preview: [preview text]

[email body]

Return the complete email ready to send."
        ),
        ContentType::AdCopy => format!(
            "Write ad copy based on this marketing angle.

{context}
Requirements:
- Generate a minimum of 3 variations
- Each variation must include:
  - Headline
  - Primary text (body copy)
- Make it punchy and benefit-driven
- Match the specified tone: {tone}
- Aim for the {length} length guideline
- Do NOT include meta explanations or instructions
- Output ONLY the finished ad copy variations

Format each variation as:
Variation 1:
Headline: [headline]
Primary Text: [body copy]

Variation 2:
[repeat format]

Return all variations ready to use."
        ),
        ContentType::SocialCaption => format!(
            "Write a social media caption based on this marketing angle.

{context}
Requirements:
- Start with a strong, attention-grabbing first line
- Write in a conversational tone
- Include optional relevant hashtags at the end (3-5 hashtags)
- Match the specified tone: {tone}
- Aim for the {length} length guideline (compact for Short, expressive for Long)
- Do NOT include meta explanations or instructions
- Output ONLY the finished social caption

Return the complete social caption ready to post."
        ),
    }
}

/// Token budget for a content request; long blog posts get more room.
pub fn max_tokens(req: &ContentRequest) -> u32 {
    match (req.content_type, req.length.unwrap_or_default()) {
        (ContentType::BlogPost, ContentLength::Long) => 3000,
        _ => 2000,
    }
}

/// Image prompt built from the angle's visual suggestion. `None` when there is nothing to draw.
pub fn image_prompt(req: &ContentRequest) -> Option<String> {
    let visual = req.visual_suggestion.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
    let tone = req.tone.as_deref().unwrap_or("Professional");
    let channel = req.channel.as_deref().unwrap_or("social media");

    let mut prompt = String::from("Create a professional, high-quality marketing image.\n\n");
    push_field(&mut prompt, "Visual concept", Some(visual));
    push_field(&mut prompt, "Theme", Some(&req.angle_name));
    push_field(&mut prompt, "Context", Some(&req.headline));
    push_field(&mut prompt, "Tone", Some(tone));
    push_field(&mut prompt, "Channel", Some(channel));
    push_field(&mut prompt, "Target audience", req.audience.as_deref());
    prompt.push_str(&format!(
        "\nThe image should be visually compelling, modern, and suitable for marketing use. \
It should clearly represent the visual concept while maintaining a {tone} aesthetic appropriate for {channel}. \
High resolution, professional quality, engaging composition."
    ));

    Some(prompt)
}
