//! Instruction text sent alongside every edit.
//!
//! The identity directive is part of the contract with the model: changing
//! its wording changes the output, so bump [`IDENTITY_DIRECTIVE_VERSION`]
//! whenever it is edited.

/// Revision of [`IDENTITY_DIRECTIVE`].
///
/// Revision 1 keeps the wording of the first deployed directive but
/// normalizes its layout: one sentence group per line, no indentation and
/// no trailing spaces.
pub const IDENTITY_DIRECTIVE_VERSION: u32 = 1;

/// Fixed instruction restricting the edit to clothing and accessories.
pub const IDENTITY_DIRECTIVE: &str = "IDENTITY-PRESERVING VIRTUAL TRY-ON MODE:\n\
The user wants to edit their outfit.\n\
CRITICAL INSTRUCTION: You MUST keep the face, hair, skin tone, body shape, and pose of the person in the source image EXACTLY the same.\n\
Only modify the clothing and accessories according to the user prompt.\n\
Maintain photorealism and high resolution.";

/// Appended when a reference garment image accompanies the request.
pub const REFERENCE_INSTRUCTION: &str =
    "Use the provided reference garment image as the primary style source for the new outfit.";

/// Builds the instruction text: directive first, then the user's request verbatim.
pub fn compose_instruction(prompt: &str, has_reference: bool) -> String {
    let mut text = format!("{IDENTITY_DIRECTIVE}\n\nUser Request: {prompt}");
    if has_reference {
        text.push_str("\n\n");
        text.push_str(REFERENCE_INSTRUCTION);
    }
    text
}
