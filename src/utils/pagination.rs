/// Page window resolved from optional `page` / `perPage` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
    pub offset: u32,
}

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

impl PageWindow {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

        Self {
            page,
            per_page,
            offset: (page - 1).saturating_mul(per_page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(
            PageWindow::new(None, None),
            PageWindow { page: 1, per_page: 20, offset: 0 }
        );
        assert_eq!(
            PageWindow::new(Some(0), Some(1000)),
            PageWindow { page: 1, per_page: 100, offset: 0 }
        );
        assert_eq!(PageWindow::new(Some(3), Some(10)).offset, 20);
    }
}
