/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

/// Object storage folder for category images (relative to the image root)
pub const CATEGORY_IMAGE_FOLDER: &str = "categories";

/// Object storage folder for product images (relative to the image root)
pub const PRODUCT_IMAGE_FOLDER: &str = "products";
