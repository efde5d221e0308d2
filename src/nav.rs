//! Page identifiers and the route table.

use serde::Serialize;
use serde_json::json;

use crate::error::DashboardError;
use crate::logging::{log_notice, log_page_rendered, log_page_selected, ProfileScope};
use crate::pages::{self, Notice, Page, PageContext};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageId {
    #[default]
    Executive,
    Campaigns,
    Customers,
    Products,
    Geography,
    Attribution,
    Model,
}

impl PageId {
    /// Sidebar order.
    pub const ALL: [PageId; 7] = [
        PageId::Executive,
        PageId::Campaigns,
        PageId::Customers,
        PageId::Products,
        PageId::Geography,
        PageId::Attribution,
        PageId::Model,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PageId::Executive => "executive",
            PageId::Campaigns => "campaigns",
            PageId::Customers => "customers",
            PageId::Products => "products",
            PageId::Geography => "geography",
            PageId::Attribution => "attribution",
            PageId::Model => "model",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PageId::Executive => "Executive Overview",
            PageId::Campaigns => "Campaign Analytics",
            PageId::Customers => "Customer Insights",
            PageId::Products => "Product Performance",
            PageId::Geography => "Geographic Analysis",
            PageId::Attribution => "Attribution & Funnel",
            PageId::Model => "ML Model Evaluation",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            PageId::Executive => "🏠",
            PageId::Campaigns => "📈",
            PageId::Customers => "👥",
            PageId::Products => "📦",
            PageId::Geography => "🗺️",
            PageId::Attribution => "🎯",
            PageId::Model => "🤖",
        }
    }

    pub fn from_slug(slug: &str) -> Result<Self, DashboardError> {
        Self::ALL
            .into_iter()
            .find(|p| p.slug() == slug)
            .ok_or_else(|| DashboardError::UnknownPage(slug.to_string()))
    }
}

pub type PageFn = fn(&PageContext) -> Page;

/// The only mapping from page identifier to page routine.
pub const ROUTES: [(PageId, PageFn); 7] = [
    (PageId::Executive, pages::executive::render),
    (PageId::Campaigns, pages::campaigns::render),
    (PageId::Customers, pages::customers::render),
    (PageId::Products, pages::products::render),
    (PageId::Geography, pages::geography::render),
    (PageId::Attribution, pages::attribution::render),
    (PageId::Model, pages::model::render),
];

pub fn route(id: PageId) -> PageFn {
    ROUTES
        .iter()
        .find(|(page, _)| *page == id)
        .map(|(_, f)| *f)
        .unwrap_or(pages::executive::render)
}

pub fn render_page(id: PageId, ctx: &PageContext) -> Page {
    let _scope = ProfileScope::with_context("render_page", &[("page", json!(id.slug()))]);
    let page = route(id)(ctx);
    for notice in &page.notices {
        if let Notice::MalformedColumn { table, detail } = notice {
            log_notice(id.slug(), table, detail);
        }
    }
    log_page_rendered(id.slug(), page.charts().len(), page.notices.len());
    page
}

/// Holds the one active page. `select` is the only transition.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    active: PageId,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> PageId {
        self.active
    }

    /// Make `id` the active page and return the one it replaced.
    pub fn select(&mut self, id: PageId) -> PageId {
        let previous = std::mem::replace(&mut self.active, id);
        if previous != id {
            log_page_selected(previous.slug(), id.slug());
        }
        previous
    }
}
