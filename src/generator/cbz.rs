use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::{get_file_name_lossy, path_to_string_lossy};
use async_trait::async_trait;
use memmap2::MmapOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages are stored under their own file name, without any directory prefix, in the order
/// they are added. No metadata file is written.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    output_path: PathBuf,
    page_count: usize,
}

impl Cbz {
    /// Path of the archive being written.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

#[async_trait]
impl Generator for Cbz {
    fn new(output_dir: &Path, base_filename: &str) -> Result<Self> {
        let options: SimpleFileOptions = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir)?;
        }

        let output_path = output_dir.join(format!("{}.cbz", base_filename));
        let file = File::create(&output_path)?;

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            options,
            output_path,
            page_count: 0,
        })
    }

    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self> {
        let entry_name = get_file_name_lossy(image_path);

        let file = fs::File::open(image_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open image file '{}': {}",
                    path_to_string_lossy(image_path),
                    e
                ),
            ))
        })?;
        let length = file.metadata().await?.len();
        let file_std = file.into_std().await;
        let options = self.options;

        let zip = match self.zip.as_mut() {
            Some(z) => z,
            None => {
                return Err(Error::Other("Zip writer not available".to_string()));
            }
        };

        zip.start_file(entry_name, options)?;

        if length > 0 {
            // Create the read-only memory map
            let mmap = spawn_blocking(move || unsafe { MmapOptions::new().map(&file_std) })
                .await
                .map_err(|e| Error::AsyncTaskError(e.to_string()))??;
            zip.write_all(&mmap[..])?;
        }

        self.page_count += 1;

        Ok(self)
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn save(mut self) -> Result<PathBuf> {
        let zip = match self.zip.take() {
            Some(z) => z,
            None => {
                return Err(Error::Other("Zip writer not available".to_string()));
            }
        };

        // Finish writing the zip file in a blocking task
        spawn_blocking(move || match zip.finish() {
            Ok(_) => Ok(()),
            Err(e) => Err(Error::Zip(e)),
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        Ok(self.output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::scratch_dir;
    use std::io::Read;

    #[tokio::test]
    async fn test_cbz_uses_flat_entry_names_in_insertion_order() -> Result<()> {
        let dir = scratch_dir("cbz_flat_entries");
        let pages = dir.join("Chapter 1");
        std::fs::create_dir_all(&pages)?;
        std::fs::write(pages.join("a.jpg"), b"first")?;
        std::fs::write(pages.join("b.png"), b"")?;

        let mut cbz = Cbz::new(&dir, "Chapter 1")?;
        cbz.add_page(&pages.join("a.jpg")).await?;
        cbz.add_page(&pages.join("b.png")).await?;
        assert_eq!(cbz.page_count(), 2);
        let path = cbz.save().await?;
        assert_eq!(path, dir.join("Chapter 1.cbz"));

        let mut archive = zip::ZipArchive::new(File::open(&path)?)?;
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut ordered = Vec::new();
        for i in 0..archive.len() {
            ordered.push(archive.by_index(i)?.name().to_string());
        }
        assert_eq!(ordered, vec!["a.jpg", "b.png"]);
        assert_eq!(names.len(), 2);

        let mut content = String::new();
        archive.by_name("a.jpg")?.read_to_string(&mut content)?;
        assert_eq!(content, "first");

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
