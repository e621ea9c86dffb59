pub mod block_catalogue;
pub mod block_instance;
pub mod image_cache;
pub mod input_image;
