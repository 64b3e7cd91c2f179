mod app;

pub use app::{SheetViewer, ViewerPresenter};
