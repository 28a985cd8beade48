//! Prompt templates for the resolution protocols.
//!
//! All oracle prompts are built here so the wording stays in one place.
//! Key lists are rendered as JSON arrays; the form always belongs to the
//! USER, so the prompts steer the oracle away from role-specific names.

fn keys_json(keys: &[String]) -> String {
    serde_json::to_string(keys).unwrap_or_else(|_| "[]".to_string())
}

fn labels_json(labels: &[String]) -> String {
    serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string())
}

/// Ordinal suffix for a 1-based index.
fn ordinal_suffix(index: usize) -> &'static str {
    if (10..=20).contains(&(index % 100)) {
        return "th";
    }
    match index % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Asks for the literal placeholder strings present in a form.
pub fn placeholder_detection(form_text: &str) -> String {
    format!(
        "You are a form analysis assistant. Look at this form text and identify ALL placeholder strings that represent blank fields to be filled in.\n\n\
         FORM TEXT:\n{form_text}\n\n\
         Find every placeholder string in the form that represents a field where information should be entered. \
         These could be underscores, dots, dashes, text in brackets, text in parentheses, or any other pattern that indicates a fillable field.\n\n\
         Respond with ONLY a JSON array containing the exact placeholder strings you find. \
         Include each unique placeholder string exactly as it appears in the form. \
         Format your response as a single line JSON array with no line breaks.\n\n\
         Examples of what to look for:\n\
         - _____ (underscores)\n\
         - ..... (dots)\n\
         - Any other pattern that clearly represents a fillable field\n\n\
         Example response: [\"_____\", \"........\"]\n\
         Your response:"
    )
}

/// Asks to map each placeholder in an entry to an available key.
pub fn fill_entry_match(keys: &[String], entry_text: &str, spot_count: usize) -> String {
    format!(
        "You are a form-filling assistant. Your task is to match placeholders in form text to available context keys.\n\n\
         AVAILABLE CONTEXT KEYS: {}\n\n\
         FORM TEXT TO ANALYZE:\n{entry_text}\n\n\
         INSTRUCTIONS:\n\
         1. Examine each placeholder in the order they appear in the text\n\
         2. The form refers to the USER filling it - avoid interpreting roles like 'recipient', 'applicant', etc.\n\
         3. For each placeholder, determine if any of the available context keys would provide the appropriate information to fill it (prefer the most general key when multiple match)\n\
         4. Only match a key if you are confident it's the correct information for that placeholder. The key must be in the list of AVAILABLE CONTEXT KEYS\n\
         5. If no key matches or you're unsure, use null\n\n\
         EXAMPLE:\n\
         Text: 'Name: _______ Date: _______'\n\
         Keys: [\"full_name\", \"birth_date\", \"address\"]\n\
         Response: [\"full_name\", \"birth_date\"]\n\n\
         Respond with ONLY a JSON array of {spot_count} elements (keys or null):",
        keys_json(keys)
    )
}

/// Stricter re-request after a malformed key-assignment response.
pub fn fill_entry_retry(keys: &[String], entry_text: &str, spot_count: usize) -> String {
    format!(
        "IMPORTANT: Your previous response could not be parsed as JSON. Please respond with EXACTLY the format requested.\n\n\
         {}\n\n\
         CRITICAL FORMATTING REQUIREMENTS:\n\
         1. Respond with ONLY a JSON array, nothing else\n\
         2. Use double quotes, not single quotes\n\
         3. Use null (not None) for missing values\n\
         4. Do not include any explanations or code blocks\n\
         5. The array must have exactly {spot_count} elements\n\
         6. Each element must be either null or one of the AVAILABLE CONTEXT KEYS exactly as provided (case-sensitive)\n\n\
         Example of correct format: [null, \"key_name\", null]\n\
         Your response:",
        fill_entry_match(keys, entry_text, spot_count)
    )
}

/// Asks for a new key name for a placeholder no existing key covers.
pub fn missing_key_inference(
    entry_text: &str,
    placeholder_context: &str,
    placeholder_index: usize,
    pattern: &str,
) -> String {
    let j = placeholder_index + 1;
    format!(
        "You are a form-filling assistant. Analyze this form text and suggest an appropriate context key name.\n\n\
         FORM TEXT:\n{entry_text}\n\n\
         SPECIFIC PLACEHOLDER CONTEXT:\n{placeholder_context}\n\n\
         INSTRUCTIONS:\n\
         1. Look at the context around the placeholder pattern {pattern}.\n\
         2. On its line, this is the {j}{} placeholder (counting from left to right if multiple placeholders exist).\n\
         3. Determine what type of information should go in this placeholder\n\
         4. Suggest a descriptive key name using snake_case (e.g., 'full_name', 'phone_number', 'birth_date')\n\
         5. The person filling the form is always the USER themselves - avoid qualifiers like 'recipient', 'patient', 'applicant', etc.\n\
         6. Pick the most general and concise key name possible (e.g., prefer 'name' over 'recipients_name').\n\n\
         EXAMPLES:\n\
         - 'Name: _______' -> 'full_name'\n\
         - 'Phone: _______' -> 'phone_number'\n\
         - 'Date of Birth: _______' -> 'birth_date'\n\
         - 'Recipient's Name: _______' -> 'name'\n\n\
         Respond with ONLY the key name (no quotes, no explanation):",
        ordinal_suffix(j)
    )
}

/// Asks for the value of a key within the aggregated personal corpus.
pub fn context_value_search(key: &str, corpus: &str) -> String {
    format!(
        "You are an assistant tasked with retrieving information from a user's personal document corpus.\n\n\
         REQUESTED KEY: {key}\n\n\
         CORPUS:\n{corpus}\n\n\
         INSTRUCTIONS:\n\
         1. Examine the corpus and determine the single most appropriate value for the requested key.\n\
         2. If the information is clearly present, respond with ONLY that value.\n\
         3. If the information is not present or you are uncertain, respond with the single word null (without quotes).\n\
         4. Do NOT provide any additional text, explanation, or formatting."
    )
}

/// Asks which existing key a checkbox group represents.
pub fn checkbox_context_key(keys: &[String], group_text: &str, labels: &[String]) -> String {
    format!(
        "You are a form-filling assistant. Analyze this checkbox group and determine which context key is most relevant.\n\n\
         AVAILABLE CONTEXT KEYS: {}\n\n\
         CHECKBOX GROUP:\n{group_text}\n\n\
         CHECKBOX OPTIONS: {}\n\n\
         INSTRUCTIONS:\n\
         1. Look at the context around the checkboxes\n\
         2. Remember the form is about the USER themselves; avoid role-specific prefixes (e.g., 'applicant', 'patient').\n\
         3. Determine what type of information these checkboxes represent\n\
         4. Find the most relevant context key from the available keys (use the most general name possible)\n\
         5. If no key is clearly relevant, respond with 'none'\n\n\
         EXAMPLES:\n\
         - Checkboxes for 'Gender: [ ] Male [ ] Female' -> 'gender'\n\
         - Checkboxes for 'Marital Status: [ ] Single [ ] Married' -> 'marital_status'\n\
         - Checkboxes for 'Education: [ ] High School [ ] College' -> 'education'\n\n\
         Respond with ONLY the key name or 'none' (no quotes, no explanation):",
        keys_json(keys),
        labels_json(labels)
    )
}

/// Asks to invent a descriptive key name for a checkbox group.
pub fn checkbox_infer_key(group_text: &str, labels: &[String]) -> String {
    format!(
        "You are a form-filling assistant. Analyze this checkbox group and suggest an appropriate context key name.\n\n\
         CHECKBOX GROUP:\n{group_text}\n\n\
         CHECKBOX OPTIONS: {}\n\n\
         INSTRUCTIONS:\n\
         1. Look at the context around the checkboxes\n\
         2. Determine what type of information these checkboxes represent\n\
         3. Suggest a descriptive key name using snake_case (e.g., 'gender', 'marital_status', 'education_level')\n\
         4. The form is filled by the USER - avoid qualifiers like 'applicant', 'patient', 'recipient', etc.\n\
         5. Use the most general and concise key name possible (e.g., 'gender' not 'applicant_gender').\n\n\
         EXAMPLES:\n\
         - 'Gender: [ ] Male [ ] Female' -> 'gender'\n\
         - 'Marital Status: [ ] Single [ ] Married' -> 'marital_status'\n\
         - 'Education: [ ] High School [ ] College' -> 'education_level'\n\
         - 'Applicant Gender: [ ] Male [ ] Female' -> 'gender'\n\n\
         Respond with ONLY the key name (no quotes, no explanation):",
        labels_json(labels)
    )
}

/// Asks which option indices should be checked for a known value.
pub fn checkbox_selection(key: &str, value: &str, labels: &[String]) -> String {
    format!(
        "You are a form-filling assistant. Determine which checkboxes should be checked based on the context value.\n\n\
         CONTEXT KEY: {key}\n\
         CONTEXT VALUE: {value}\n\n\
         CHECKBOX OPTIONS: {}\n\n\
         INSTRUCTIONS:\n\
         1. Compare the context value with each checkbox option\n\
         2. Determine which checkbox options match or are most relevant to the context value\n\
         3. Return the indices (0-based) of checkboxes that should be checked\n\
         4. If no checkboxes should be checked, return an empty array\n\
         5. Multiple checkboxes can be checked if appropriate\n\n\
         EXAMPLES:\n\
         Context: 'Male', Options: ['Male', 'Female'] -> [0]\n\
         Context: 'Single', Options: ['Single', 'Married', 'Divorced'] -> [0]\n\
         Context: 'Bachelor Degree', Options: ['High School', 'College', 'Graduate'] -> [1]\n\n\
         Respond with ONLY a JSON array of indices (e.g., [0], [1, 2], or []):",
        labels_json(labels)
    )
}

/// Stricter re-request after a malformed selection response.
pub fn checkbox_selection_retry(key: &str, value: &str, labels: &[String]) -> String {
    format!(
        "IMPORTANT: Your previous response could not be parsed as JSON. Please respond with EXACTLY the format requested.\n\n\
         {}\n\n\
         CRITICAL FORMATTING REQUIREMENTS:\n\
         1. Respond with ONLY a JSON array of numbers, nothing else\n\
         2. Use square brackets [ ]\n\
         3. Use integers for indices (0, 1, 2, etc.)\n\
         4. Separate multiple indices with commas\n\
         5. Do not include any explanations or code blocks\n\n\
         Example of correct format: [0] or [1, 2] or []\n\
         Your response:",
        checkbox_selection(key, value, labels)
    )
}
