//! Prompt templates for the review and Q&A tasks.

/// Scientific-review prompt for a fluorescent probe, fed with whatever
/// source material the aggregation layer collected.
pub fn review_prompt(subject: &str, context: &str) -> String {
    format!(
        "You are an expert chemical biologist. Write a short, professional \
         scientific summary for the fluorescent probe: \"{subject}\".\n\
         \n\
         Use these data sources:\n\
         {context}\n\
         \n\
         Format the response strictly as follows:\n\
         **1. Overview:** What is it and what is it used for?\n\
         **2. Properties:** Mention structure and excitation/emission if known.\n\
         **3. Performance:** Extract any Limit of Detection (LOD) or sensitivity mentions.\n\
         **4. Applications:** Key use cases (e.g. mitochondria, ROS, ions).\n\
         \n\
         Keep it concise, scientific, and factual. Do not hallucinate data."
    )
}

/// Grounded question-answering prompt.
pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an expert chemical biologist. Answer the question below \
         using only the provided context. If the context does not contain \
         the answer, say so plainly.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         QUESTION: {question}\n\
         \n\
         Keep the answer short and factual."
    )
}
