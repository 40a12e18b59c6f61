//! Synthetic AKPK package builder shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Offset of the folder table in every package the builder writes
const FOLDER_TABLE_OFFSET: usize = 0x1C;

#[derive(Debug, Clone)]
pub struct BankSpec {
    pub id: u32,
    pub folder_id: u32,
    pub multiplier: u32,
    pub header_body: Vec<u8>,
    /// `(id, data)` of files listed in the bank's DIDX index
    pub embedded: Vec<(u32, Vec<u8>)>,
    pub hirc_body: Vec<u8>,
}

impl BankSpec {
    pub fn new(id: u32, folder_id: u32) -> Self {
        Self {
            id,
            folder_id,
            multiplier: 16,
            header_body: b"bank-header-body".to_vec(),
            embedded: Vec::new(),
            hirc_body: b"hirc-objects".to_vec(),
        }
    }

    pub fn with_embedded(mut self, id: u32, data: &[u8]) -> Self {
        self.embedded.push((id, data.to_vec()));
        self
    }

    /// The bytes an extracted `.bnk` must contain: header section then HIRC section
    pub fn expected_bnk(&self, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BKHD");
        out.extend_from_slice(&u32_bytes(self.header_body.len() as u32, big_endian));
        out.extend_from_slice(&self.header_body);
        out.extend_from_slice(b"HIRC");
        out.extend_from_slice(&u32_bytes(self.hirc_body.len() as u32, big_endian));
        out.extend_from_slice(&self.hirc_body);
        out
    }

    fn encode(&self, big_endian: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"BKHD");
        out.extend_from_slice(&u32_bytes(self.header_body.len() as u32, big_endian));
        out.extend_from_slice(&self.header_body);

        if !self.embedded.is_empty() {
            let mut data = Vec::new();
            let mut index = Vec::new();
            for (id, bytes) in &self.embedded {
                index.extend_from_slice(&u32_bytes(*id, big_endian));
                index.extend_from_slice(&u32_bytes(data.len() as u32, big_endian));
                index.extend_from_slice(&u32_bytes(bytes.len() as u32, big_endian));
                data.extend_from_slice(bytes);
            }
            out.extend_from_slice(b"DIDX");
            out.extend_from_slice(&u32_bytes(index.len() as u32, big_endian));
            out.extend_from_slice(&index);
            out.extend_from_slice(b"DATA");
            out.extend_from_slice(&u32_bytes(data.len() as u32, big_endian));
            out.extend_from_slice(&data);
        }

        out.extend_from_slice(b"HIRC");
        out.extend_from_slice(&u32_bytes(self.hirc_body.len() as u32, big_endian));
        out.extend_from_slice(&self.hirc_body);
        out
    }
}

#[derive(Debug, Clone)]
pub struct FileSpec {
    pub id: u32,
    pub folder_id: u32,
    pub multiplier: u32,
    pub data: Vec<u8>,
}

impl FileSpec {
    pub fn new(id: u32, folder_id: u32, data: &[u8]) -> Self {
        Self {
            id,
            folder_id,
            multiplier: 16,
            data: data.to_vec(),
        }
    }
}

/// Builds package bytes laid out as header, folder table, bank table,
/// sound file table, then bank and file payloads.
#[derive(Debug, Clone, Default)]
pub struct PckBuilder {
    pub big_endian: bool,
    pub folders: Vec<(u32, String)>,
    pub banks: Vec<BankSpec>,
    pub files: Vec<FileSpec>,
}

impl PckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn folder(mut self, id: u32, name: &str) -> Self {
        self.folders.push((id, name.to_string()));
        self
    }

    pub fn bank(mut self, bank: BankSpec) -> Self {
        self.banks.push(bank);
        self
    }

    pub fn file(mut self, file: FileSpec) -> Self {
        self.files.push(file);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let be = self.big_endian;

        let folder_table = self.encode_folder_table();
        let bank_table_size = 4 + 16 * self.banks.len();
        let sound_table_size = 4 + 20 * self.files.len();
        let tables_end = FOLDER_TABLE_OFFSET + folder_table.len() + bank_table_size + sound_table_size;

        // Lay out payloads after the tables, each aligned to its multiplier
        let mut payload = Vec::new();
        let mut bank_offsets = Vec::new();
        for bank in &self.banks {
            align(&mut payload, tables_end, bank.multiplier);
            bank_offsets.push(tables_end + payload.len());
            payload.extend_from_slice(&bank.encode(be));
        }
        let mut file_offsets = Vec::new();
        for file in &self.files {
            align(&mut payload, tables_end, file.multiplier);
            file_offsets.push(tables_end + payload.len());
            payload.extend_from_slice(&file.data);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"AKPK");
        out.extend_from_slice(&u32_bytes((tables_end - 8) as u32, be));
        out.extend_from_slice(&u32_bytes(1, be));
        out.extend_from_slice(&u32_bytes(folder_table.len() as u32, be));
        out.extend_from_slice(&u32_bytes(bank_table_size as u32, be));
        out.extend_from_slice(&u32_bytes(sound_table_size as u32, be));
        out.extend_from_slice(&u32_bytes(0, be));
        assert_eq!(out.len(), FOLDER_TABLE_OFFSET);

        out.extend_from_slice(&folder_table);

        out.extend_from_slice(&u32_bytes(self.banks.len() as u32, be));
        for (bank, offset) in self.banks.iter().zip(&bank_offsets) {
            out.extend_from_slice(&u32_bytes(bank.id, be));
            out.extend_from_slice(&u32_bytes(bank.multiplier, be));
            out.extend_from_slice(&u32_bytes(raw_offset(*offset, bank.multiplier), be));
            out.extend_from_slice(&u32_bytes(bank.folder_id, be));
        }

        out.extend_from_slice(&u32_bytes(self.files.len() as u32, be));
        for (file, offset) in self.files.iter().zip(&file_offsets) {
            out.extend_from_slice(&u32_bytes(file.id, be));
            out.extend_from_slice(&u32_bytes(file.multiplier, be));
            out.extend_from_slice(&u32_bytes(file.data.len() as u32, be));
            out.extend_from_slice(&u32_bytes(raw_offset(*offset, file.multiplier), be));
            out.extend_from_slice(&u32_bytes(file.folder_id, be));
        }
        assert_eq!(out.len(), tables_end);

        out.extend_from_slice(&payload);
        out
    }

    /// Write the package into `dir` as `{name}.pck`.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{name}.pck"));
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    fn encode_folder_table(&self) -> Vec<u8> {
        let be = self.big_endian;
        let entries_len = 4 + 8 * self.folders.len();

        let mut names = Vec::new();
        let mut entries = Vec::new();
        for (id, name) in &self.folders {
            entries.extend_from_slice(&u32_bytes((entries_len + names.len()) as u32, be));
            entries.extend_from_slice(&u32_bytes(*id, be));
            names.extend_from_slice(&encode_name(name, be));
        }

        let mut table = u32_bytes(self.folders.len() as u32, be).to_vec();
        table.extend_from_slice(&entries);
        table.extend_from_slice(&names);
        while table.len() % 4 != 0 {
            table.push(0);
        }
        table
    }
}

/// Little-endian packages pad every name character with a zero byte.
pub fn encode_name(name: &str, big_endian: bool) -> Vec<u8> {
    let mut out = Vec::new();
    for byte in name.bytes() {
        out.push(byte);
        if !big_endian {
            out.push(0);
        }
    }
    out.push(0);
    if !big_endian {
        out.push(0);
    }
    out
}

pub fn u32_bytes(value: u32, big_endian: bool) -> [u8; 4] {
    if big_endian {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    }
}

fn raw_offset(offset: usize, multiplier: u32) -> u32 {
    if multiplier == 0 {
        0
    } else {
        (offset / multiplier as usize) as u32
    }
}

fn align(payload: &mut Vec<u8>, base: usize, multiplier: u32) {
    let step = multiplier.max(1) as usize;
    while (base + payload.len()) % step != 0 {
        payload.push(0);
    }
}
