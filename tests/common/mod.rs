//! A small in-memory cabinet writer used to produce test inputs.

#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use cabextract::CompressionType;
use flate2::Compression;
use time::PrimitiveDateTime;

const MAX_UNCOMPRESSED_BLOCK_SIZE: usize = 0x8000;
const MSZIP_SIGNATURE: u16 = 0x4B43;
const MSZIP_BLOCK_TERMINATOR: u16 = 0x0003;

const ATTR_READ_ONLY: u16 = 0x01;
const ATTR_HIDDEN: u16 = 0x02;
const ATTR_SYSTEM: u16 = 0x04;
const ATTR_ARCH: u16 = 0x20;
const ATTR_NAME_IS_UTF: u16 = 0x80;

pub struct FileBuilder {
    name: String,
    data: Vec<u8>,
    attributes: u16,
    datetime: (u16, u16),
    folder_index: Option<u16>,
}

impl FileBuilder {
    pub fn set_datetime(&mut self, datetime: PrimitiveDateTime) -> &mut Self {
        self.datetime = datetime_to_bits(datetime);
        self
    }

    pub fn set_is_read_only(&mut self, enable: bool) -> &mut Self {
        self.set_attribute(ATTR_READ_ONLY, enable)
    }

    pub fn set_is_hidden(&mut self, enable: bool) -> &mut Self {
        self.set_attribute(ATTR_HIDDEN, enable)
    }

    pub fn set_is_system(&mut self, enable: bool) -> &mut Self {
        self.set_attribute(ATTR_SYSTEM, enable)
    }

    pub fn set_is_archive(&mut self, enable: bool) -> &mut Self {
        self.set_attribute(ATTR_ARCH, enable)
    }

    /// Writes `index` into the file entry instead of the real folder index.
    pub fn set_folder_index(&mut self, index: u16) -> &mut Self {
        self.folder_index = Some(index);
        self
    }

    fn set_attribute(&mut self, bit: u16, enable: bool) -> &mut Self {
        if enable {
            self.attributes |= bit;
        } else {
            self.attributes &= !bit;
        }
        self
    }
}

pub struct FolderBuilder {
    compression_type: CompressionType,
    files: Vec<FileBuilder>,
    reserve_data: Vec<u8>,
}

impl FolderBuilder {
    pub fn add_file<S: Into<String>, D: Into<Vec<u8>>>(
        &mut self,
        name: S,
        data: D,
    ) -> &mut FileBuilder {
        let name = name.into();
        let mut attributes = ATTR_ARCH;
        if name.bytes().any(|byte| byte > 0x7f) {
            attributes |= ATTR_NAME_IS_UTF;
        }
        self.files.push(FileBuilder {
            name,
            data: data.into(),
            attributes,
            datetime: (0x21, 0),
            folder_index: None,
        });
        self.files.last_mut().unwrap()
    }

    pub fn set_reserve_data(&mut self, data: Vec<u8>) {
        self.reserve_data = data;
    }
}

#[derive(Default)]
pub struct CabinetBuilder {
    folders: Vec<FolderBuilder>,
    header_reserve: Vec<u8>,
    folder_reserve_size: u8,
    data_reserve_size: u8,
    skip_checksums: bool,
}

impl CabinetBuilder {
    pub fn new() -> CabinetBuilder {
        CabinetBuilder::default()
    }

    pub fn add_folder(&mut self, ctype: CompressionType) -> &mut FolderBuilder {
        self.folders.push(FolderBuilder {
            compression_type: ctype,
            files: Vec::new(),
            reserve_data: Vec::new(),
        });
        self.folders.last_mut().unwrap()
    }

    /// Declares reserve areas: `header` is stored in the header, and every
    /// folder entry and data block gets the given number of extra bytes.
    pub fn set_reserve(&mut self, header: Vec<u8>, folder: u8, data: u8) {
        self.header_reserve = header;
        self.folder_reserve_size = folder;
        self.data_reserve_size = data;
    }

    /// Leaves every data block checksum at zero.
    pub fn skip_checksums(&mut self) {
        self.skip_checksums = true;
    }

    pub fn build(&self) -> Vec<u8> {
        let has_reserve = !self.header_reserve.is_empty()
            || self.folder_reserve_size > 0
            || self.data_reserve_size > 0;
        let header_len = 36
            + if has_reserve { 4 + self.header_reserve.len() } else { 0 };
        let folder_entry_len = 8 + self.folder_reserve_size as usize;
        let first_file_offset =
            header_len + self.folders.len() * folder_entry_len;
        let file_table_len: usize = self
            .folders
            .iter()
            .flat_map(|folder| folder.files.iter())
            .map(|file| 16 + file.name.len() + 1)
            .sum();

        let mut data_area = Vec::new();
        let mut folder_blocks = Vec::new();
        let data_start = first_file_offset + file_table_len;
        for folder in self.folders.iter() {
            let offset = (data_start + data_area.len()) as u32;
            let num_blocks = self.write_folder_data(folder, &mut data_area);
            folder_blocks.push((offset, num_blocks));
        }
        let total_size = data_start + data_area.len();

        let num_files: usize =
            self.folders.iter().map(|folder| folder.files.len()).sum();
        let mut out = Vec::<u8>::with_capacity(total_size);
        out.write_all(b"MSCF").unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(total_size as u32).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(first_file_offset as u32).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u8(3).unwrap();
        out.write_u8(1).unwrap();
        out.write_u16::<LittleEndian>(self.folders.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(num_files as u16).unwrap();
        out.write_u16::<LittleEndian>(if has_reserve { 0x4 } else { 0 })
            .unwrap();
        out.write_u16::<LittleEndian>(0x1234).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        if has_reserve {
            out.write_u16::<LittleEndian>(self.header_reserve.len() as u16)
                .unwrap();
            out.write_u8(self.folder_reserve_size).unwrap();
            out.write_u8(self.data_reserve_size).unwrap();
            out.write_all(&self.header_reserve).unwrap();
        }
        for (folder, &(offset, num_blocks)) in
            self.folders.iter().zip(folder_blocks.iter())
        {
            out.write_u32::<LittleEndian>(offset).unwrap();
            out.write_u16::<LittleEndian>(num_blocks).unwrap();
            let bits = folder.compression_type.to_bitfield();
            out.write_u16::<LittleEndian>(bits).unwrap();
            let mut reserve = folder.reserve_data.clone();
            reserve.resize(self.folder_reserve_size as usize, 0);
            out.write_all(&reserve).unwrap();
        }
        assert_eq!(out.len(), first_file_offset);
        for (folder_index, folder) in self.folders.iter().enumerate() {
            let mut offset_within_folder = 0u32;
            for file in folder.files.iter() {
                let size = file.data.len() as u32;
                let index = file.folder_index.unwrap_or(folder_index as u16);
                out.write_u32::<LittleEndian>(size).unwrap();
                out.write_u32::<LittleEndian>(offset_within_folder).unwrap();
                out.write_u16::<LittleEndian>(index).unwrap();
                out.write_u16::<LittleEndian>(file.datetime.0).unwrap();
                out.write_u16::<LittleEndian>(file.datetime.1).unwrap();
                out.write_u16::<LittleEndian>(file.attributes).unwrap();
                out.write_all(file.name.as_bytes()).unwrap();
                out.write_u8(0).unwrap();
                offset_within_folder += size;
            }
        }
        assert_eq!(out.len(), data_start);
        out.extend_from_slice(&data_area);
        out
    }

    fn write_folder_data(
        &self,
        folder: &FolderBuilder,
        out: &mut Vec<u8>,
    ) -> u16 {
        let stream: Vec<u8> = folder
            .files
            .iter()
            .flat_map(|file| file.data.iter().copied())
            .collect();
        let mut compressor = flate2::Compress::new(Compression::best(), false);
        let chunks: Vec<&[u8]> =
            stream.chunks(MAX_UNCOMPRESSED_BLOCK_SIZE).collect();
        for (index, chunk) in chunks.iter().enumerate() {
            let is_last = index + 1 == chunks.len();
            let payload = match folder.compression_type {
                CompressionType::None => chunk.to_vec(),
                CompressionType::MsZip => {
                    mszip_block(&mut compressor, chunk, is_last)
                }
                other => panic!("Cannot write {:?} folders", other),
            };
            let sizes = (payload.len() as u32) | ((chunk.len() as u32) << 16);
            let checksum = if self.skip_checksums {
                0
            } else {
                checksum(&payload, sizes)
            };
            out.write_u32::<LittleEndian>(checksum).unwrap();
            out.write_u16::<LittleEndian>(payload.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(chunk.len() as u16).unwrap();
            out.resize(out.len() + self.data_reserve_size as usize, 0xee);
            out.extend_from_slice(&payload);
        }
        chunks.len() as u16
    }
}

fn mszip_block(
    compressor: &mut flate2::Compress,
    data: &[u8],
    is_last_block: bool,
) -> Vec<u8> {
    let mut out = Vec::<u8>::with_capacity(0xffff);
    out.write_u16::<LittleEndian>(MSZIP_SIGNATURE).unwrap();
    let flush = if is_last_block {
        flate2::FlushCompress::Finish
    } else {
        flate2::FlushCompress::Sync
    };
    compressor.compress_vec(data, &mut out, flush).unwrap();
    if !is_last_block {
        out.write_u16::<LittleEndian>(MSZIP_BLOCK_TERMINATOR).unwrap();
    }
    // Fall back to a single stored block if compression didn't pay off.
    let max_out_len = data.len() + 7;
    if out.len() > max_out_len {
        out.clear();
        out.write_u16::<LittleEndian>(MSZIP_SIGNATURE).unwrap();
        out.push(1);
        out.write_u16::<LittleEndian>(data.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(!(data.len() as u16)).unwrap();
        out.extend_from_slice(data);
    }
    out
}

/// The data block checksum, seeded with the block's two size fields.
pub fn checksum(data: &[u8], seed: u32) -> u32 {
    let mut chunks = data.chunks_exact(4);
    let mut value = seed;
    for chunk in &mut chunks {
        value ^= u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let tail = chunks
        .remainder()
        .iter()
        .fold(0u32, |tail, &byte| (tail << 8) | byte as u32);
    value ^ tail
}

pub fn datetime_to_bits(datetime: PrimitiveDateTime) -> (u16, u16) {
    let year = datetime.year().clamp(1980, 2107) as u16;
    let date = ((year - 1980) << 9)
        | ((datetime.month() as u16) << 5)
        | datetime.day() as u16;
    let time = ((datetime.hour() as u16) << 11)
        | ((datetime.minute() as u16) << 5)
        | (datetime.second() as u16 / 2);
    (date, time)
}

pub fn random_bytes(num_bytes: usize) -> Vec<u8> {
    use rand::{RngCore, SeedableRng};

    let mut data = vec![0; num_bytes];
    rand::rngs::SmallRng::from_entropy().fill_bytes(&mut data);
    data
}
