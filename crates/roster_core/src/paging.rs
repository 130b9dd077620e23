//! Sorting and pagination primitives for member queries.
//!
//! # Responsibility
//! - Describe which window of a result set a caller wants (`PageRequest`).
//! - Carry query results with the metadata each shape promises
//!   (`Page` with a total count, `Slice` with a has-next flag).
//!
//! # Invariants
//! - Page numbers are zero-based.
//! - Page size is at least 1.
//! - Sort properties are a closed set; no caller text reaches SQL.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingError {
    InvalidPageSize,
    UnknownProperty(String),
    UnknownDirection(String),
}

impl Display for PagingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize => write!(f, "page size must be at least 1"),
            Self::UnknownProperty(value) => write!(f, "unknown sort property `{value}`"),
            Self::UnknownDirection(value) => {
                write!(f, "unknown sort direction `{value}`; expected asc|desc")
            }
        }
    }
}

impl Error for PagingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn parse(value: &str) -> Result<Self, PagingError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(PagingError::UnknownDirection(other.to_string())),
        }
    }
}

/// Member attributes that queries may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberProperty {
    Id,
    Username,
    Age,
}

impl MemberProperty {
    fn parse(value: &str) -> Result<Self, PagingError> {
        match value.trim() {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "age" => Ok(Self::Age),
            other => Err(PagingError::UnknownProperty(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: MemberProperty,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: MemberProperty) -> Self {
        Self {
            property,
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: MemberProperty) -> Self {
        Self {
            property,
            direction: Direction::Desc,
        }
    }
}

/// Ordered list of sort keys; earlier orders take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(direction: Direction, property: MemberProperty) -> Self {
        Self {
            orders: vec![Order {
                property,
                direction,
            }],
        }
    }

    /// Appends `other`'s orders after this sort's orders.
    pub fn and(mut self, other: Sort) -> Self {
        self.orders.extend(other.orders);
        self
    }

    /// Parses the `property[,direction]` request format, e.g. `username,desc`.
    ///
    /// Direction defaults to ascending.
    pub fn parse(value: &str) -> Result<Self, PagingError> {
        let mut parts = value.splitn(2, ',');
        let property = MemberProperty::parse(parts.next().unwrap_or_default())?;
        let direction = match parts.next() {
            Some(direction) => Direction::parse(direction)?,
            None => Direction::Asc,
        };
        Ok(Self::by(direction, property))
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Zero-based page window with an optional sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> Result<Self, PagingError> {
        if size == 0 {
            return Err(PagingError::InvalidPageSize);
        }
        Ok(Self {
            page,
            size,
            sort: Sort::unsorted(),
        })
    }

    pub fn of_sorted(
        page: u32,
        size: u32,
        direction: Direction,
        property: MemberProperty,
    ) -> Result<Self, PagingError> {
        Ok(Self::of(page, size)?.with_sort(Sort::by(direction, property)))
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            ..self.clone()
        }
    }
}

/// One page of results plus the total row count of the whole query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.size))
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Converts the content while keeping page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }

    /// Like `map`, stopping at the first conversion error.
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        })
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

/// One page of results that only knows whether another page follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    has_next: bool,
}

impl<T> Slice<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, has_next: bool) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            has_next,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next
    }

    pub fn map<U, F>(self, f: F) -> Slice<U>
    where
        F: FnMut(T) -> U,
    {
        Slice {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            has_next: self.has_next,
        }
    }
}

impl<T> IntoIterator for Slice<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Slice<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, MemberProperty, Order, Page, PageRequest, PagingError, Slice, Sort};

    #[test]
    fn page_request_rejects_zero_size() {
        assert_eq!(PageRequest::of(0, 0), Err(PagingError::InvalidPageSize));
    }

    #[test]
    fn offset_and_navigation_follow_page_number() {
        let request = PageRequest::of(2, 3).unwrap();
        assert_eq!(request.offset(), 6);
        assert_eq!(request.next().offset(), 9);
        assert_eq!(request.previous_or_first().page(), 1);
        assert_eq!(PageRequest::of(0, 3).unwrap().previous_or_first().page(), 0);
    }

    #[test]
    fn page_metadata_for_first_of_two_pages() {
        let request = PageRequest::of(0, 3).unwrap();
        let page = Page::new(vec![1, 2, 3], &request, 5);
        assert_eq!(page.total_pages(), 2);
        assert!(page.is_first());
        assert!(page.has_next());
        assert!(!page.is_last());
        assert!(!page.has_previous());
    }

    #[test]
    fn empty_page_has_no_pages() {
        let request = PageRequest::of(0, 10).unwrap();
        let page: Page<i32> = Page::new(Vec::new(), &request, 0);
        assert_eq!(page.total_pages(), 0);
        assert!(page.is_last());
    }

    #[test]
    fn map_keeps_metadata() {
        let request = PageRequest::of(1, 2).unwrap();
        let page = Page::new(vec![3, 4], &request, 5).map(|n| n.to_string());
        assert_eq!(page.content(), ["3".to_string(), "4".to_string()]);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_elements(), 5);

        let slice = Slice::new(vec![1], &request, false).map(|n| n * 10);
        assert_eq!(slice.content(), [10]);
        assert!(slice.is_last());
    }

    #[test]
    fn sort_parse_reads_property_and_direction() {
        assert_eq!(
            Sort::parse("username,desc").unwrap(),
            Sort::by(Direction::Desc, MemberProperty::Username)
        );
        assert_eq!(
            Sort::parse("age").unwrap().orders(),
            [Order::asc(MemberProperty::Age)]
        );
        assert_eq!(
            Sort::parse("team,asc"),
            Err(PagingError::UnknownProperty("team".to_string()))
        );
        assert_eq!(
            Sort::parse("age,sideways"),
            Err(PagingError::UnknownDirection("sideways".to_string()))
        );
    }

    #[test]
    fn sort_and_appends_orders() {
        let sort = Sort::by(Direction::Desc, MemberProperty::Age)
            .and(Sort::by(Direction::Asc, MemberProperty::Username));
        assert_eq!(
            sort.orders(),
            [
                Order::desc(MemberProperty::Age),
                Order::asc(MemberProperty::Username)
            ]
        );
    }
}
