pub mod candidate_directory;
pub mod crawler_gateway;
pub mod og_metadata;
pub mod party_codes;
