use iced::widget::{Column, container, scrollable, text};
use iced::{Element, Length};

use crate::search::SheetPresenter;
use crate::sheet::ContactSheet;

#[derive(Debug, Clone)]
pub enum Message {}

#[derive(Debug, Clone)]
struct ShownSheet {
    caption: String,
    handle: iced::widget::image::Handle,
}

/// Window listing every contact sheet of a run, one under another.
#[derive(Debug, Clone)]
pub struct SheetViewer {
    sheets: Vec<ShownSheet>,
}

impl SheetViewer {
    fn update(&mut self, message: Message) {
        match message {}
    }

    fn view(&self) -> Element<'_, Message> {
        let mut content = Column::new().spacing(20).padding(20);
        for sheet in &self.sheets {
            content = content
                .push(text(sheet.caption.clone()).size(18))
                .push(iced::widget::image(sheet.handle.clone()));
        }

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Open the viewer and block until the window is closed.
    pub fn run(self) -> anyhow::Result<()> {
        iced::application(move || self.clone(), SheetViewer::update, SheetViewer::view)
            .title("facesheet - contact sheets")
            .run()
            .map_err(|e| anyhow::anyhow!("Contact sheet viewer failed: {}", e))
    }
}

/// Collects sheets during a search and shows them together when it ends.
#[derive(Default)]
pub struct ViewerPresenter {
    sheets: Vec<ShownSheet>,
}

impl ViewerPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetPresenter for ViewerPresenter {
    fn present(&mut self, term: &str, file: &str, sheet: ContactSheet) -> anyhow::Result<()> {
        let (width, height) = sheet.image.dimensions();
        let rgba = image::DynamicImage::ImageLuma8(sheet.image).to_rgba8();
        self.sheets.push(ShownSheet {
            caption: format!("Search term: {}. Faces found in file {}:", term, file),
            handle: iced::widget::image::Handle::from_rgba(width, height, rgba.into_raw()),
        });
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        if self.sheets.is_empty() {
            return Ok(());
        }
        SheetViewer {
            sheets: std::mem::take(&mut self.sheets),
        }
        .run()
    }
}
