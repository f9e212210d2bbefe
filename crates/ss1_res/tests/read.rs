use flate2::{write::ZlibEncoder, Compression};
use pretty_assertions::assert_eq;
use ss1_res::{
    error::{Error, Result},
    ContentType, ResourceId, ResourceReader,
};
use std::io::{Cursor, Read, Write};
use tracing::info;
use tracing_test::traced_test;

struct Fixture {
    data: Vec<u8>,
    entries: Vec<u8>,
    count: u16,
}

impl Fixture {
    fn new() -> Self {
        let mut data = b"LG Res File v2\r\n\x1a".to_vec();
        data.resize(0x80, 0x00);
        Self {
            data,
            entries: Vec::new(),
            count: 0,
        }
    }

    fn add(mut self, id: u16, flags: u8, content_type: u8, unpacked: usize, stored: &[u8]) -> Self {
        self.entries.extend_from_slice(&id.to_le_bytes());
        self.entries.extend_from_slice(&(unpacked as u32).to_le_bytes()[..3]);
        self.entries.push(flags);
        self.entries
            .extend_from_slice(&(stored.len() as u32).to_le_bytes()[..3]);
        self.entries.push(content_type);
        self.count += 1;

        self.data.extend_from_slice(stored);
        while self.data.len() % 4 != 0 {
            self.data.push(0x00);
        }
        self
    }

    fn finish(mut self) -> Vec<u8> {
        let directory_offset = self.data.len() as u32;
        self.data[0x7C..0x80].copy_from_slice(&directory_offset.to_le_bytes());
        self.data.extend_from_slice(&self.count.to_le_bytes());
        self.data.extend_from_slice(&0x80u32.to_le_bytes());
        self.data.extend_from_slice(&self.entries);
        self.data
    }
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn block_table(first_block_offset: u32, ends: &[u32]) -> Vec<u8> {
    let mut table = (ends.len() as u16).to_le_bytes().to_vec();
    table.extend_from_slice(&first_block_offset.to_le_bytes());
    for end in ends {
        table.extend_from_slice(&end.to_le_bytes());
    }
    table
}

/// Four resources covering every combination of the compound and compressed flags
fn sample_file() -> Vec<u8> {
    let mut uncompressed_compound = block_table(14, &[18, 21]);
    uncompressed_compound.extend_from_slice(&[0x30, 0x30, 0x30, 0x30, 0x31, 0x31, 0x31]);

    let mut compressed_compound = block_table(18, &[20, 24, 25]);
    compressed_compound.extend(zlib(&[0x40, 0x40, 0x41, 0x41, 0x41, 0x41, 0x42]));

    Fixture::new()
        .add(0x4000, 0x00, 0x01, 3, &[0x01, 0x01, 0x01])
        .add(0x4001, 0x01, 0x02, 2, &zlib(&[0x02, 0x02]))
        .add(0x4002, 0x02, 0x03, 21, &uncompressed_compound)
        .add(0x4003, 0x03, 0x04, 25, &compressed_compound)
        .finish()
}

fn all_blocks(reader: &mut ResourceReader<Cursor<Vec<u8>>>, id: u16) -> Result<Vec<Vec<u8>>> {
    let resource = reader.resource(ResourceId(id))?;
    (0..resource.block_count())
        .map(|index| resource.block_data(index))
        .collect()
}

#[traced_test]
#[test]
fn read_all_resource_kinds() -> Result<()> {
    let mut reader = ResourceReader::new(Cursor::new(sample_file()))?;

    assert_eq!(
        reader.ids(),
        vec![
            ResourceId(0x4000),
            ResourceId(0x4001),
            ResourceId(0x4002),
            ResourceId(0x4003)
        ]
    );

    for (id, content_type, compound, compressed) in [
        (0x4000, 0x01, false, false),
        (0x4001, 0x02, false, true),
        (0x4002, 0x03, true, false),
        (0x4003, 0x04, true, true),
    ] {
        info!("checking {}", ResourceId(id));
        let resource = reader.resource(ResourceId(id))?;
        assert_eq!(resource.content_type, ContentType(content_type));
        assert_eq!(resource.compound, compound);
        assert_eq!(resource.compressed, compressed);
    }

    assert_eq!(all_blocks(&mut reader, 0x4000)?, vec![vec![0x01, 0x01, 0x01]]);
    assert_eq!(all_blocks(&mut reader, 0x4001)?, vec![vec![0x02, 0x02]]);
    assert_eq!(
        all_blocks(&mut reader, 0x4002)?,
        vec![vec![0x30, 0x30, 0x30, 0x30], vec![0x31, 0x31, 0x31]]
    );
    assert_eq!(
        all_blocks(&mut reader, 0x4003)?,
        vec![
            vec![0x40, 0x40],
            vec![0x41, 0x41, 0x41, 0x41],
            vec![0x42]
        ]
    );

    Ok(())
}

#[traced_test]
#[test]
fn read_blocks_interleaved() -> Result<()> {
    let mut reader = ResourceReader::new(Cursor::new(sample_file()))?;
    let simple = reader.resource(ResourceId(0x4000))?;
    let compound = reader.resource(ResourceId(0x4002))?;

    let mut first = compound.block(0)?;
    let mut second = compound.block(1)?;
    let mut other = simple.block(0)?;

    let mut byte = [0u8; 1];
    for expected in [0x30, 0x31, 0x01] {
        let reader: &mut dyn Read = match expected {
            0x30 => &mut first,
            0x31 => &mut second,
            _ => &mut other,
        };
        reader.read_exact(&mut byte)?;
        assert_eq!(byte, [expected]);
    }

    let mut rest = Vec::new();
    first.read_to_end(&mut rest)?;
    assert_eq!(rest, vec![0x30, 0x30, 0x30]);

    Ok(())
}

#[traced_test]
#[test]
fn read_compressed_blocks_in_any_order() -> Result<()> {
    let mut reader = ResourceReader::new(Cursor::new(sample_file()))?;
    let resource = reader.resource(ResourceId(0x4003))?;

    assert_eq!(resource.block_data(2)?, vec![0x42]);
    assert_eq!(resource.block_data(0)?, vec![0x40, 0x40]);
    assert_eq!(resource.block_data(2)?, vec![0x42]);
    assert!(matches!(
        resource.block(3),
        Err(Error::BlockIndexOutOfRange { index: 3, count: 3 })
    ));

    Ok(())
}

#[test]
fn read_compound_without_blocks() -> Result<()> {
    let file = Fixture::new()
        .add(0x0010, 0x02, 0x00, 6, &block_table(6, &[]))
        .finish();
    let mut reader = ResourceReader::new(Cursor::new(file))?;

    let resource = reader.resource(ResourceId(0x0010))?;
    assert!(resource.compound);
    assert_eq!(resource.block_count(), 0);

    Ok(())
}

#[test]
fn read_decreasing_block_table() -> Result<()> {
    let mut stored = block_table(14, &[18, 16]);
    stored.extend_from_slice(&[0x00; 4]);
    let file = Fixture::new().add(0x0020, 0x02, 0x00, 18, &stored).finish();
    let mut reader = ResourceReader::new(Cursor::new(file))?;

    for _ in 0..2 {
        assert!(matches!(
            reader.resource(ResourceId(0x0020)),
            Err(Error::MalformedBlockTable {
                id: ResourceId(0x0020)
            })
        ));
    }

    Ok(())
}

#[test]
fn read_block_table_beyond_resource() -> Result<()> {
    let mut stored = block_table(10, &[40]);
    stored.extend_from_slice(&[0x05; 4]);
    let file = Fixture::new().add(0x0030, 0x02, 0x00, 14, &stored).finish();
    let mut reader = ResourceReader::new(Cursor::new(file))?;

    assert!(matches!(
        reader.resource(ResourceId(0x0030)),
        Err(Error::MalformedBlockTable {
            id: ResourceId(0x0030)
        })
    ));

    Ok(())
}

#[test]
fn read_compressed_payload_shorter_than_table() -> Result<()> {
    let mut stored = block_table(10, &[20]);
    stored.extend(zlib(&[0x60, 0x61, 0x62, 0x63]));
    let file = Fixture::new().add(0x0040, 0x03, 0x00, 20, &stored).finish();
    let mut reader = ResourceReader::new(Cursor::new(file))?;

    let resource = reader.resource(ResourceId(0x0040))?;
    assert_eq!(resource.block_count(), 1);
    assert!(matches!(
        resource.block(0),
        Err(Error::MalformedBlockTable {
            id: ResourceId(0x0040)
        })
    ));

    Ok(())
}

#[test]
fn read_compressed_simple_bounded_by_unpacked_length() -> Result<()> {
    let file = Fixture::new()
        .add(0x0050, 0x01, 0x00, 3, &zlib(&[0x01, 0x02, 0x03, 0x04, 0x05]))
        .finish();
    let mut reader = ResourceReader::new(Cursor::new(file))?;

    assert_eq!(
        reader.resource(ResourceId(0x0050))?.block_data(0)?,
        vec![0x01, 0x02, 0x03]
    );

    Ok(())
}
