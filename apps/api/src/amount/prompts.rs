// Prompt for spelling the purchase price in Hungarian words.

pub const AMOUNT_WORDS_PROMPT: &str = r#"Convert the number {number} to Hungarian words.
The output should be capitalized and written as one word group, the way amounts are written on contracts.
For example, if the input is 123, the output should be "Egyszázhuszonhárom".

Return exactly this JSON structure:
{"words": "string"}"#;
