//! Prompt construction for the three generation tasks.

use crate::models::enums::ComplianceTag;

/// Whole-document requirement extraction. Asks for a JSON object with a
/// top-level `requirements` array.
pub fn document_requirements_prompt(text_data: &str) -> String {
    format!(
        r#"You are an expert Business Analyst and Software Quality Assurance Engineer specializing in medical software (IEC 62304, FDA, HIPAA). Your task is to analyze the provided healthcare software document and extract a comprehensive, detailed list of functional and non-functional requirements.

#Instructions:

##Scope & Granularity:

Extract only requirements that are atomic, testable, and significant.
Each requirement must be substantial enough to support at least 4-5 distinct, non-overlapping test cases.
Avoid trivial or overly broad statements.
Focus on requirements that define specific system behaviors, constraints, or capabilities.

##Requirement Description Depth:

The "description" field must be thorough and detailed (minimum 5-7 sentences).
Describe the expected behavior, preconditions, constraints, user/system interactions, failure conditions, and compliance considerations.
Provide enough context so that a test designer could directly derive multiple test scenarios from the description without ambiguity.

Requirement Format (JSON):
{{
    "requirements": [
        {{
            "type": "Functional | Non-Functional | Regulatory",
            "title": "A concise, descriptive title for the requirement, ideally under 10 words",
            "description": "A detailed description of the requirement, clearly outlining the expected behavior or constraint",
            "source": "The specific section or page number from the document where this requirement was found",
            "category": "Data Acquisition | Security | Interoperability | Usability | Analytics | Compliance | etc.",
            "priority": "High | Medium | Low"
        }}
    ]
}}

Document Text to Analyze:
{text_data}

Output (JSON Array):
"#
    )
}

/// Per-line requirement extraction enriched with semantic-search context.
/// Asks for one JSON object.
pub fn contextual_requirement_prompt(requirement: &str, contexts: &[String]) -> String {
    let contexts_text = contexts
        .iter()
        .enumerate()
        .map(|(i, content)| format!("Context {}: {}", i + 1, content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert Business Analyst and Software Quality Assurance Engineer specializing in medical software (IEC 62304, FDA, HIPAA).
Your task is to analyze the given requirement and relevant context to generate a comprehensive functional or non-functional requirement that aligns with medical software standards.

Given Requirement: {requirement}

Similar Context from Existing Documents:
{contexts_text}

#Instructions:

##Context Integration:
- Use the provided similar contexts to enrich and validate the requirement
- Ensure alignment with existing system functionality and constraints
- Incorporate relevant compliance and regulatory considerations from context

##Output Requirements:
- Generate ONE detailed requirement that combines the input with contextual understanding
- Ensure compatibility with existing system features shown in the context
- Include relevant medical standards and compliance needs discovered from context

Output Format (Single JSON Object):
{{
    "type": "Functional | Non-Functional | Regulatory",
    "title": "A concise, descriptive title (under 10 words)",
    "description": "Detailed requirement description with context integration",
    "source": "The specific section or page number from the document where this requirement was found in Context",
    "category": "Data Acquisition | Security | Interoperability | Usability | Analytics | Compliance",
    "priority": "High | Medium | Low"
}}

Output (Single JSON Object):
"#
    )
}

/// Test-case generation for one requirement. Returns `(system, user)`;
/// the response must be a JSON object with a `test_cases` array.
pub fn test_cases_prompt(
    feature_title: &str,
    feature_desc: &str,
    input_data: &str,
) -> (String, String) {
    let standards = [
        ComplianceTag::Fda,
        ComplianceTag::Iec62304,
        ComplianceTag::Iso9001,
        ComplianceTag::Iso13485,
        ComplianceTag::Iso27001,
    ]
    .iter()
    .map(|t| format!("\"{}\"", t.as_str()))
    .collect::<Vec<_>>()
    .join(", ");

    let system = "You are a senior QA engineer specializing in healthcare system software. \
        Produce thorough, actionable test cases with good coverage across functional, negative, boundary, performance, security, and compliance dimensions. \
        Each test case should include step-by-step instructions and an explicit expected result. \
        All outputs and processing must be privacy-preserving by design, GDPR-ready, and suitable for safe pilots in healthcare environments. \
        Do not include or infer any real patient data or personally identifiable information (PII)."
        .to_string();

    let input_section = if input_data.is_empty() {
        "[If required, generate realistic dummy data for healthcare system software, strictly non-PII and privacy-preserving]"
    } else {
        input_data
    };

    let user = format!(
        "Generate a comprehensive but non-duplicative set of test cases for the healthcare feature below.\n\
         Return STRICT JSON with this exact schema:\n\
         {{ \"test_cases\": [\n\
           {{\"test_id\": \"TC-001\", \"title\": \"...\", \"description\": \"Step by step instructions...\", \"input_data\": \"...\", \"expected_result\": \"...\", \"compliance\": [\"FDA\", \"IEC 62304\", ...], \"risk\": \"...\" }}\n\
         ]}}\n\n\
         Feature Title: {feature_title}\n\
         Feature Description: {feature_desc}\n\n\
         Compliance options to choose from: [{standards}].\n\
         Risk levels to consider: Choose any one Low, Medium, High, Critical.\n\
         Only include compliance items that are relevant to the test; omit others.\n\
         Input Data for Testing: {input_section}\n\
         For each test case, provide:\n\
         - Step by step instructions in the description to test the result.\n\
         - An explicit expected_result field describing the expected outcome.\n\
         - If input_data is provided, use it; otherwise, generate dummy input_data relevant to healthcare systems, ensuring no PII or sensitive data is present.\n\
         All outputs must be suitable for GDPR-compliant, privacy-preserving healthcare pilots."
    );

    (system, user)
}

/// Description-improvement prompt. Returns `(system, user)`; the response is
/// plain text.
pub fn improve_prompt(original_description: &str, user_input: &str) -> (String, String) {
    let system = "You are a senior QA engineer. Improve the following test case description based on user feedback."
        .to_string();
    let user = format!(
        "Original Test Description: {original_description}\n\
         User Input: {user_input}\n\
         Return only the improved test case description as a string."
    );
    (system, user)
}
