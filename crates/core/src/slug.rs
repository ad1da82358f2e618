//! URL slug generation.
//!
//! Category, brand and product names are mostly Vietnamese, so diacritics
//! (including `đ`) are folded to their ASCII base letter before slugging.

/// Build a URL slug from a display name.
///
/// Lowercases, folds accented Latin letters to ASCII, collapses every run of
/// other characters into a single `-`, and trims leading/trailing dashes.
///
/// # Example
///
/// ```
/// use storedesk_core::build_slug;
///
/// assert_eq!(build_slug("Điện thoại & Máy tính bảng"), "dien-thoai-may-tinh-bang");
/// ```
#[must_use]
pub fn build_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let folded = fold(c);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Map a lowercase letter to its unaccented ASCII base.
const fn fold(c: char) -> char {
    match c {
        'à' | 'á' | 'ả' | 'ã' | 'ạ' | 'ă' | 'ằ' | 'ắ' | 'ẳ' | 'ẵ' | 'ặ' | 'â' | 'ầ' | 'ấ'
        | 'ẩ' | 'ẫ' | 'ậ' | 'ä' | 'å' | 'ā' => 'a',
        'è' | 'é' | 'ẻ' | 'ẽ' | 'ẹ' | 'ê' | 'ề' | 'ế' | 'ể' | 'ễ' | 'ệ' | 'ë' | 'ē' => 'e',
        'ì' | 'í' | 'ỉ' | 'ĩ' | 'ị' | 'î' | 'ï' | 'ī' => 'i',
        'ò' | 'ó' | 'ỏ' | 'õ' | 'ọ' | 'ô' | 'ồ' | 'ố' | 'ổ' | 'ỗ' | 'ộ' | 'ơ' | 'ờ' | 'ớ'
        | 'ở' | 'ỡ' | 'ợ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'ủ' | 'ũ' | 'ụ' | 'ư' | 'ừ' | 'ứ' | 'ử' | 'ữ' | 'ự' | 'û' | 'ü' | 'ū' => 'u',
        'ỳ' | 'ý' | 'ỷ' | 'ỹ' | 'ỵ' | 'ÿ' => 'y',
        'đ' => 'd',
        'ç' => 'c',
        'ñ' => 'n',
        'ß' => 's',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_name() {
        assert_eq!(build_slug("Running Shoes"), "running-shoes");
    }

    #[test]
    fn test_vietnamese_name() {
        assert_eq!(build_slug("Áo thun Nam"), "ao-thun-nam");
        assert_eq!(build_slug("Đồ gia dụng"), "do-gia-dung");
        assert_eq!(build_slug("Sữa bột trẻ em"), "sua-bot-tre-em");
    }

    #[test]
    fn test_collapses_and_trims_separators() {
        assert_eq!(build_slug("  --Hello,   World!!  "), "hello-world");
        assert_eq!(build_slug("a/b_c.d"), "a-b-c-d");
    }

    #[test]
    fn test_keeps_digits() {
        assert_eq!(build_slug("iPhone 15 Pro Max"), "iphone-15-pro-max");
    }

    #[test]
    fn test_nothing_sluggable() {
        assert_eq!(build_slug("!!!"), "");
        assert_eq!(build_slug(""), "");
    }
}
