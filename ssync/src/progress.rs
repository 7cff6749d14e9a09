//! Per-file progress bars for the copy stage.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Shared progress display for concurrent copies; bars are hidden unless
/// progress was requested.
#[derive(Clone)]
pub struct Progress {
    multi: Option<MultiProgress>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi: enabled.then(MultiProgress::new),
        }
    }

    /// Add a byte-progress bar for one transfer.
    pub fn file_bar(&self, label: &str, size: u64) -> ProgressBar {
        let Some(multi) = &self.multi else {
            return ProgressBar::hidden();
        };
        let bar = multi.add(ProgressBar::new(size));
        bar.set_style(
            ProgressStyle::with_template("{msg:32!} {bar:20} {bytes}/{total_bytes}")
                .unwrap() // static template
                .progress_chars("=> "),
        );
        bar.set_message(label.to_string());
        bar
    }
}

/// AsyncRead adapter that advances a progress bar as bytes flow through.
pub struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, bar: ProgressBar) -> Self {
        Self { inner, bar }
    }
}

impl<R: tokio::io::AsyncRead + Unpin> tokio::io::AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let this = self.get_mut();
        match std::pin::Pin::new(&mut this.inner).poll_read(cx, buf) {
            std::task::Poll::Ready(Ok(())) => {
                this.bar.inc((buf.filled().len() - before) as u64);
                std::task::Poll::Ready(Ok(()))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn reader_ticks_the_bar_to_the_byte_count() {
        let bar = ProgressBar::hidden();
        bar.set_length(11);
        let mut reader = ProgressReader::new(&b"hello world"[..], bar.clone());
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"hello world");
        assert_eq!(bar.position(), 11);
    }

    #[test]
    fn disabled_progress_hands_out_hidden_bars() {
        let progress = Progress::new(false);
        let bar = progress.file_bar("x", 10);
        assert!(bar.is_hidden());
    }
}
