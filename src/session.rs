//! Session and navigation control.
//!
//! Owns the folder listing and the current image, drives the active labeling
//! tool around navigation (flush on leave, reload on arrive), and is the
//! single entry point for toolkit input events. Blocking dialogs go through
//! the [`Frontend`] trait, the only surface the windowing glue implements.

use std::path::PathBuf;

use crate::config::LabelerConfig;
use crate::event::InputEvent;
use crate::format::LabelError;
use crate::keybindings::{Action, KeyBindings};
use crate::mapper::DisplayMapper;
use crate::tool::{LabelTool, ToolEvent};

/// Blocking user-interface services provided by the windowing glue.
pub trait Frontend {
    /// Show a blocking alert.
    fn alert(&mut self, message: &str);

    /// Ask a yes/no question; true means yes.
    fn confirm(&mut self, message: &str) -> bool;

    /// Ask for a 1-based image number in `1..=total`, or `None` on cancel.
    fn ask_image_number(&mut self, current: usize, total: usize) -> Option<usize>;
}

/// The decoded image currently on screen.
pub struct CurrentImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pixels: image::RgbaImage,
}

impl CurrentImage {
    /// RGBA pixel buffer for the display layer.
    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }
}

/// What a navigation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// The current image changed.
    Moved,
    /// Nothing happened (boundary reached or dialog cancelled).
    Stayed,
    /// The operator declined the restart prompt; the session is over.
    Finished,
}

/// Folder session for one labeling tool.
pub struct Session<T: LabelTool> {
    config: LabelerConfig,
    bindings: KeyBindings,
    folder: PathBuf,
    images: Vec<PathBuf>,
    index: usize,
    current: Option<CurrentImage>,
    tool: T,
    finished: bool,
}

impl<T: LabelTool> Session<T> {
    /// Scan `folder` for images matching the config's extension allow-list.
    /// The listing is sorted and scanned once; external changes are not
    /// watched.
    pub fn open(
        folder: impl Into<PathBuf>,
        config: LabelerConfig,
        tool: T,
    ) -> Result<Self, String> {
        let folder = folder.into();
        let mut images: Vec<PathBuf> = std::fs::read_dir(&folder)
            .map_err(|e| format!("Failed to read folder: {}", e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && config.matches_extension(path))
            .collect();

        if images.is_empty() {
            return Err("No image files found in folder".to_string());
        }
        images.sort();
        log::info!("opened folder {:?} with {} images", folder, images.len());

        Ok(Self {
            config,
            bindings: KeyBindings::new(),
            folder,
            images,
            index: 0,
            current: None,
            tool,
            finished: false,
        })
    }

    pub fn config(&self) -> &LabelerConfig {
        &self.config
    }

    pub fn folder(&self) -> &PathBuf {
        &self.folder
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<&CurrentImage> {
        self.current.as_ref()
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    pub fn tool_mut(&mut self) -> &mut T {
        &mut self.tool
    }

    /// True after the operator declined the restart prompt.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Progress string like "3/15".
    pub fn progress(&self) -> String {
        format!("{}/{}", self.index + 1, self.images.len())
    }

    /// Sidecar label path of the current image.
    pub fn current_label_path(&self) -> Option<PathBuf> {
        self.images.get(self.index).map(|p| p.with_extension("txt"))
    }

    /// Load (or reload) the image at the current index and hand its sidecar
    /// to the tool. On decode failure the previous state is left untouched.
    pub fn load_current(&mut self, frontend: &mut dyn Frontend) -> bool {
        let Some(path) = self.images.get(self.index).cloned() else {
            self.current = None;
            self.tool.clear();
            return false;
        };

        let current = match decode_image(&path) {
            Ok(current) => current,
            Err(e) => {
                frontend.alert(&format!("Cannot load image {}: {}", path.display(), e));
                return false;
            }
        };
        log::info!(
            "image {} loaded: {:?} ({}x{})",
            self.progress(),
            path.file_name().unwrap_or_default(),
            current.width,
            current.height
        );
        self.current = Some(current);

        let label = path.with_extension("txt");
        match self.tool.begin_image(&label) {
            Ok(report) => {
                if !report.is_clean() {
                    log::warn!(
                        "{} problem lines in {:?}",
                        report.diagnostics().len(),
                        label
                    );
                }
            }
            Err(e) => {
                // The tool already reset to an empty state.
                frontend.alert(&format!("Failed to load annotations: {}", e));
            }
        }
        true
    }

    /// Flush the current annotations through the tool. On failure the
    /// in-memory edits are kept and the operator is alerted.
    pub fn save(&mut self, frontend: &mut dyn Frontend) -> bool {
        let Some(label) = self.current_label_path() else {
            return true;
        };
        if self.current.is_none() {
            return true;
        }
        match self.tool.flush(&label) {
            Ok(()) => true,
            Err(e) => {
                frontend.alert(&format!("Failed to save annotations: {}", e));
                false
            }
        }
    }

    /// Advance to the next image. At the last image the operator chooses
    /// between restarting from the first image and ending the session.
    pub fn next(&mut self, frontend: &mut dyn Frontend) -> Navigation {
        if self.images.is_empty() {
            return Navigation::Stayed;
        }
        if self.index + 1 >= self.images.len() {
            self.save(frontend);
            if frontend.confirm("All images are annotated. Restart from the first image?") {
                self.index = 0;
                self.load_current(frontend);
                Navigation::Moved
            } else {
                self.finished = true;
                Navigation::Finished
            }
        } else {
            self.save(frontend);
            self.index += 1;
            self.load_current(frontend);
            Navigation::Moved
        }
    }

    /// Step back to the previous image; no-op at the first one.
    pub fn prev(&mut self, frontend: &mut dyn Frontend) -> Navigation {
        if self.index == 0 {
            return Navigation::Stayed;
        }
        self.save(frontend);
        self.index -= 1;
        self.load_current(frontend);
        Navigation::Moved
    }

    /// Jump to an image via the number dialog.
    pub fn jump(&mut self, frontend: &mut dyn Frontend) -> Navigation {
        let total = self.images.len();
        if total == 0 {
            return Navigation::Stayed;
        }
        let Some(number) = frontend.ask_image_number(self.index + 1, total) else {
            return Navigation::Stayed;
        };
        if number < 1 || number > total {
            return Navigation::Stayed;
        }
        self.select(number - 1, frontend)
    }

    /// Navigate to a specific listing index (click in the file list).
    pub fn select(&mut self, index: usize, frontend: &mut dyn Frontend) -> Navigation {
        if index >= self.images.len() || index == self.index {
            return Navigation::Stayed;
        }
        self.save(frontend);
        self.index = index;
        self.load_current(frontend);
        Navigation::Moved
    }

    /// Delete the current image and its label file after confirmation.
    /// On filesystem failure nothing changes.
    pub fn delete_current(&mut self, frontend: &mut dyn Frontend) -> bool {
        let Some(path) = self.images.get(self.index).cloned() else {
            return false;
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("current image");
        if !frontend.confirm(&format!("Delete {} and its label file?", name)) {
            return false;
        }

        if let Err(e) = std::fs::remove_file(&path) {
            frontend.alert(&format!("Failed to delete image: {}", e));
            return false;
        }
        let label = path.with_extension("txt");
        if label.exists() {
            if let Err(e) = std::fs::remove_file(&label) {
                // The image is already gone; report and carry on.
                frontend.alert(&format!("Failed to delete label file: {}", e));
            }
        }
        log::info!("deleted {:?}", path);

        self.images.remove(self.index);
        if self.images.is_empty() {
            self.current = None;
            self.tool.clear();
            return true;
        }
        if self.index >= self.images.len() {
            self.index = self.images.len() - 1;
        }
        self.load_current(frontend);
        true
    }

    /// Single entry point for toolkit input events.
    ///
    /// A fresh [`DisplayMapper`] is built from the widget size for every
    /// mouse event, so resizes and image switches can never leave a stale
    /// transform behind.
    pub fn handle_event(
        &mut self,
        event: InputEvent,
        widget_w: f32,
        widget_h: f32,
        frontend: &mut dyn Frontend,
    ) -> Vec<ToolEvent> {
        match event {
            InputEvent::KeyPressed { key, ctrl } => {
                let Some(action) = self.bindings.action_for(key, ctrl) else {
                    return Vec::new();
                };
                match action {
                    Action::Save => {
                        self.save(frontend);
                        Vec::new()
                    }
                    Action::PrevImage => {
                        self.prev(frontend);
                        Vec::new()
                    }
                    Action::NextImage => {
                        self.next(frontend);
                        Vec::new()
                    }
                    Action::JumpToImage => {
                        self.jump(frontend);
                        Vec::new()
                    }
                    Action::DeleteImage => {
                        self.delete_current(frontend);
                        Vec::new()
                    }
                    tool_action => {
                        let events = self.tool.apply_action(tool_action);
                        surface_events(&events, frontend);
                        events
                    }
                }
            }
            mouse_event => {
                let Some(current) = &self.current else {
                    return Vec::new();
                };
                let mapper = DisplayMapper::new(widget_w, widget_h, current.width, current.height);
                let events = self.tool.handle_mouse(&mouse_event, &mapper);
                surface_events(&events, frontend);
                events
            }
        }
    }
}

/// Decode an image and capture its natural size.
fn decode_image(path: &std::path::Path) -> Result<CurrentImage, LabelError> {
    let pixels = image::open(path)?.to_rgba8();
    let (width, height) = pixels.dimensions();
    Ok(CurrentImage {
        path: path.to_path_buf(),
        width,
        height,
        pixels,
    })
}

/// Show operator-facing warnings carried by tool events.
fn surface_events(events: &[ToolEvent], frontend: &mut dyn Frontend) {
    for event in events {
        match event {
            ToolEvent::Rejected { reason } => frontend.alert(&reason.to_string()),
            ToolEvent::IoFailed { message } => frontend.alert(message),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyCode, MouseButton, Point};
    use crate::tool::keypoint::KeypointTool;
    use std::collections::VecDeque;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeFrontend {
        alerts: Vec<String>,
        confirms: VecDeque<bool>,
        jump_answer: Option<usize>,
    }

    impl FakeFrontend {
        fn new() -> Self {
            Self {
                alerts: Vec::new(),
                confirms: VecDeque::new(),
                jump_answer: None,
            }
        }

        fn will_confirm(mut self, answer: bool) -> Self {
            self.confirms.push_back(answer);
            self
        }
    }

    impl Frontend for FakeFrontend {
        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }

        fn confirm(&mut self, _message: &str) -> bool {
            self.confirms.pop_front().unwrap_or(false)
        }

        fn ask_image_number(&mut self, _current: usize, _total: usize) -> Option<usize> {
            self.jump_answer
        }
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        image::RgbaImage::new(w, h).save(path).unwrap();
    }

    fn folder_with_images(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            write_png(&dir.path().join(name), 100, 100);
        }
        dir
    }

    fn session(dir: &TempDir) -> Session<KeypointTool> {
        let config = LabelerConfig::keypoint_defaults();
        let tool = KeypointTool::new(config.clone());
        Session::open(dir.path(), config, tool).unwrap()
    }

    fn key(session: &mut Session<KeypointTool>, key: KeyCode, ctrl: bool, fe: &mut FakeFrontend) {
        session.handle_event(InputEvent::KeyPressed { key, ctrl }, 100.0, 100.0, fe);
    }

    fn click(session: &mut Session<KeypointTool>, x: f32, y: f32, fe: &mut FakeFrontend) {
        session.handle_event(
            InputEvent::MousePressed {
                button: MouseButton::Left,
                pos: Point::new(x, y),
            },
            100.0,
            100.0,
            fe,
        );
    }

    #[test]
    fn test_open_scans_sorted_and_filtered() {
        let dir = folder_with_images(&["b.png", "a.png", "c.png"]);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let session = session(&dir);
        let names: Vec<_> = session
            .images()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_open_empty_folder_fails() {
        let dir = TempDir::new().unwrap();
        let config = LabelerConfig::keypoint_defaults();
        let tool = KeypointTool::new(config.clone());
        assert!(Session::open(dir.path(), config, tool).is_err());
    }

    #[test]
    fn test_navigation_flushes_annotations() {
        let dir = folder_with_images(&["a.png", "b.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new();
        assert!(s.load_current(&mut fe));

        // Draw a box on the first image, then navigate away.
        key(&mut s, KeyCode::Key1, false, &mut fe);
        click(&mut s, 10.0, 10.0, &mut fe);
        click(&mut s, 50.0, 50.0, &mut fe);
        assert_eq!(s.next(&mut fe), Navigation::Moved);
        assert_eq!(s.index(), 1);

        let label = dir.path().join("a.txt");
        let content = std::fs::read_to_string(&label).unwrap();
        assert!(content.starts_with("0 0.3 0.3 0.4 0.4"));

        // Coming back reloads the saved annotation.
        assert_eq!(s.prev(&mut fe), Navigation::Moved);
        assert_eq!(s.tool().annotations().len(), 1);
        assert!(fe.alerts.is_empty());
    }

    #[test]
    fn test_last_image_prompt_restart() {
        let dir = folder_with_images(&["a.png", "b.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new().will_confirm(true);
        s.load_current(&mut fe);
        s.next(&mut fe);

        assert_eq!(s.next(&mut fe), Navigation::Moved);
        assert_eq!(s.index(), 0);
        assert!(!s.finished());
    }

    #[test]
    fn test_last_image_prompt_decline_ends_session() {
        let dir = folder_with_images(&["a.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new().will_confirm(false);
        s.load_current(&mut fe);

        assert_eq!(s.next(&mut fe), Navigation::Finished);
        assert!(s.finished());
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn test_jump_via_dialog() {
        let dir = folder_with_images(&["a.png", "b.png", "c.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new();
        s.load_current(&mut fe);

        fe.jump_answer = Some(3);
        assert_eq!(s.jump(&mut fe), Navigation::Moved);
        assert_eq!(s.index(), 2);

        // Cancelled dialog stays put.
        fe.jump_answer = None;
        assert_eq!(s.jump(&mut fe), Navigation::Stayed);
        assert_eq!(s.index(), 2);
    }

    #[test]
    fn test_delete_current_removes_files_and_clamps() {
        let dir = folder_with_images(&["a.png", "b.png"]);
        std::fs::write(dir.path().join("b.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();

        let mut s = session(&dir);
        let mut fe = FakeFrontend::new().will_confirm(true);
        s.load_current(&mut fe);
        s.next(&mut fe);
        assert_eq!(s.index(), 1);

        let mut fe = FakeFrontend::new().will_confirm(true);
        assert!(s.delete_current(&mut fe));
        assert!(!dir.path().join("b.png").exists());
        assert!(!dir.path().join("b.txt").exists());
        assert_eq!(s.image_count(), 1);
        assert_eq!(s.index(), 0);
    }

    #[test]
    fn test_delete_declined_changes_nothing() {
        let dir = folder_with_images(&["a.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new().will_confirm(false);
        s.load_current(&mut fe);

        assert!(!s.delete_current(&mut fe));
        assert!(dir.path().join("a.png").exists());
        assert_eq!(s.image_count(), 1);
    }

    #[test]
    fn test_unreadable_image_alerts_and_keeps_state() {
        let dir = folder_with_images(&["a.png"]);
        std::fs::write(dir.path().join("b.png"), "not a png").unwrap();

        let mut s = session(&dir);
        let mut fe = FakeFrontend::new();
        assert!(s.load_current(&mut fe));

        // b.png sorts second; navigating to it fails to decode.
        s.next(&mut fe);
        assert_eq!(fe.alerts.len(), 1);
        assert!(fe.alerts[0].contains("Cannot load image"));
        // The previously decoded image is still current.
        assert!(s.current().is_some());
        assert_eq!(s.current().unwrap().path, dir.path().join("a.png"));
    }

    #[test]
    fn test_rejected_click_surfaces_warning() {
        let dir = folder_with_images(&["a.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new();
        s.load_current(&mut fe);

        key(&mut s, KeyCode::Key1, false, &mut fe);
        click(&mut s, 10.0, 10.0, &mut fe);
        click(&mut s, 50.0, 50.0, &mut fe);
        // Keypoint outside the box.
        click(&mut s, 80.0, 80.0, &mut fe);

        assert_eq!(fe.alerts.len(), 1);
        assert!(fe.alerts[0].contains("outside the bounding box"));
    }

    #[test]
    fn test_undo_shortcut_reaches_tool() {
        let dir = folder_with_images(&["a.png"]);
        let mut s = session(&dir);
        let mut fe = FakeFrontend::new();
        s.load_current(&mut fe);

        key(&mut s, KeyCode::Key1, false, &mut fe);
        click(&mut s, 10.0, 10.0, &mut fe);
        click(&mut s, 50.0, 50.0, &mut fe);
        assert_eq!(s.tool().annotations().len(), 1);

        key(&mut s, KeyCode::Z, true, &mut fe);
        assert_eq!(s.tool().annotations().len(), 0);
    }
}
