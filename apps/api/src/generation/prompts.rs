// Prompt templates for the generation functions.
// Placeholders in `{braces}` are replaced before sending.

pub const CV_SYSTEM: &str = "You are an expert CV writer for the French-speaking job market. \
    You turn a candidate's notes into a complete, well-structured CV.";

pub const CV_PROMPT_TEMPLATE: &str = r#"Write a complete CV for the candidate below.

Target position: {target_position}
Industry: {industry}
Years of experience: {years_experience}

Candidate's description of their background:
{ai_prompt}

Information already entered in the form (keep it, improve wording, fill gaps only from the description):
{cv_json}

{factuality_instruction}

Return a JSON object with this EXACT schema:
{
  "personalInfo": {"firstName": "", "lastName": "", "email": "", "phone": "", "address": "", "title": "", "summary": ""},
  "experiences": [{"id": "exp-1", "company": "", "position": "", "startDate": "", "endDate": "", "current": false, "description": ""}],
  "education": [{"id": "edu-1", "institution": "", "degree": "", "field": "", "startDate": "", "endDate": "", "current": false}],
  "skills": [{"id": "skill-1", "name": "", "level": "Intermédiaire"}]
}

Skill levels MUST be one of: "Débutant", "Intermédiaire", "Avancé", "Expert".
Write all prose in French unless the candidate wrote in another language."#;

pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach who writes concise, \
    specific cover letters that a recruiter reads to the end.";

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter.

Position: {job_title}
Company: {company_name}

Job description:
{job_description}

Candidate's experience:
{user_experience}

Keep it under 350 words, in three or four paragraphs, addressed to the hiring team.
Connect the candidate's experience to the stated needs of the role.

{factuality_instruction}
{plain_text_instruction}"#;

pub const RECRUITMENT_EMAIL_SYSTEM: &str = "You are an expert career coach who writes short, \
    courteous outreach emails to recruiters and hiring managers.";

pub const RECRUITMENT_EMAIL_PROMPT_TEMPLATE: &str = r#"Write a recruitment outreach email.

Recipient: {recipient_name}
Company: {company_name}
Position of interest: {position}

Candidate's background:
{user_background}

Start with a subject line in the form "Objet : ...", then a blank line, then the body.
Keep the body under 180 words and end with a clear, low-pressure call to action.

{factuality_instruction}
{plain_text_instruction}"#;
