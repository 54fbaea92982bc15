// Interview prompt templates. Placeholders are `{name}` tokens substituted with `str::replace`.

pub const EXTRACT_PROMPT_TEMPLATE: &str = r#"Parse the following resume text and extract the candidate's information.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "name": "Full Name",
  "email": "email@example.com",
  "phone": "+1234567890",
  "skills": ["skill"],
  "experience": ["one entry per role"],
  "education": ["one entry per degree"],
  "missingInfo": ["field name"]
}

RULES:
1. If a field is not found use "" for name/email/phone or [] for lists.
2. missingInfo lists every field that is missing or incomplete, e.g. ["phone", "skills"].
3. Infer skills from experience descriptions when no skills section exists.
4. Return ONLY the JSON object."#;

pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate 6 technical interview questions for a {profile} position based on the candidate's background.

CANDIDATE:
- Name: {name}
- Skills: {skills}
- Experience: {experience}
- Education: {education}

PROFILE FOCUS: {focus}

REQUIREMENTS:
- Exactly 2 easy questions (timeLimit 90-120) on fundamentals
- Exactly 2 medium questions (timeLimit 180-240) on practical problem solving
- Exactly 2 hard questions (timeLimit 300-360) on architecture and complex scenarios
- Order them easy, easy, medium, medium, hard, hard; each builds on the previous
- Ground scenarios in the candidate's experience where possible

Return a JSON array:
[
  {
    "id": "q1",
    "question": "Question text",
    "difficulty": "easy" | "medium" | "hard",
    "timeLimit": 120,
    "category": "Category name",
    "expectedKeywords": ["keyword"]
  }
]"#;

pub const SCORE_PROMPT_TEMPLATE: &str = r#"Evaluate this interview answer on a scale of 0-10.

Question: {question}
Difficulty: {difficulty}
Expected keywords: {keywords}
Time limit: {time_limit} seconds
Time spent: {time_spent} seconds

Answer:
{answer}

{previous_context}

Consider technical accuracy and depth, completeness, use of relevant concepts,
time management, clarity, and practical application.

{scoring_instruction}

Return JSON:
{
  "score": 7,
  "feedback": "Specific feedback with concrete suggestions",
  "strengths": ["strength"],
  "improvements": ["improvement"]
}"#;

pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Write an interview summary for this candidate.

Candidate: {name}
Skills: {skills}
Experience: {experience}

INTERVIEW PERFORMANCE:
{transcript}

Average score: {average}/10 (suggested overall score {overall}/100)

Return JSON:
{
  "overallScore": {overall},
  "summary": "2-3 sentences with specific observations",
  "strengths": ["strength"],
  "weaknesses": ["weakness"],
  "recommendation": "hire" | "maybe" | "no-hire"
}"#;
