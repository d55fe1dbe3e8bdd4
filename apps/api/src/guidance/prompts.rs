// Prompts for the chat-backed guidance features.
// Placeholders in braces are substituted with str::replace before sending.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

pub const CAREER_COACH_SYSTEM: &str = "You are a friendly, practical career coach. \
    Give concrete, actionable advice about careers, job searching, interviewing, \
    skills and professional growth. Keep answers concise. \
    If a question is unrelated to careers, politely steer the conversation back.";

pub const RESUME_REVIEW_PROMPT: &str = r#"Review the resume below for the target role "{target_role}".
{job_description_block}
Return a JSON object with exactly these fields:
{
  "score": integer 0-100, how well the resume fits the target role,
  "summary": one or two sentences,
  "strengths": array of short strings,
  "improvements": array of specific, actionable rewrites or additions,
  "missing_keywords": array of keywords a recruiter or ATS would expect but the resume lacks
}

RESUME:
{resume_text}"#;

pub const JOB_DESCRIPTION_BLOCK: &str = "Tailor the review to this job description:\n{job_description}\n";

pub const SKILL_GAP_PROMPT: &str = r#"A candidate wants to become a "{target_role}".
List the skills that role requires today. For each skill give its importance
and up to three concrete learning resources (course names, books or official docs).

Return a JSON object with exactly these fields:
{
  "required_skills": [
    { "name": string, "importance": "high" | "medium" | "low", "resources": [string] }
  ],
  "summary": two or three sentences of advice for someone with these skills: {current_skills}
}"#;
