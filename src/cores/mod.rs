pub mod web_en;
