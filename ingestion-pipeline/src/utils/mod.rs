pub mod file_text_extraction;
pub mod llm_instructions;
pub mod text_segmentation;
