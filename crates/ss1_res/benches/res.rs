use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

fn get_input(compressed: bool) -> Vec<u8> {
    let mut list: ss1_res::ResourceList = (0..64u16)
        .map(|index| {
            let blocks = (0..16u8)
                .map(|block| vec![block.wrapping_add(1); 256 + usize::from(index)])
                .collect();
            (
                ss1_res::ResourceId(0x1000 + index),
                ss1_res::Resource::compound(ss1_res::ContentType(0x02), compressed, blocks),
            )
        })
        .collect();

    ss1_res::write::write(std::io::Cursor::new(Vec::new()), &mut list)
        .unwrap()
        .into_inner()
}

pub mod read {
    use divan::Bencher;
    use ss1_res::{ResourceId, ResourceReader};
    use std::io::{prelude::*, Cursor};

    #[divan::bench]
    fn open(bencher: Bencher) {
        bencher
            .with_inputs(|| super::get_input(false))
            .bench_values(|data| {
                divan::black_box(ResourceReader::new(Cursor::new(data)).unwrap());
            });
    }

    #[divan::bench(args = [false, true])]
    fn read_resource_first(bencher: Bencher, compressed: bool) {
        bencher
            .with_inputs(|| ResourceReader::new(Cursor::new(super::get_input(compressed))).unwrap())
            .bench_local_refs(|res| {
                let mut buffer = Vec::new();
                let resource = res.resource(ResourceId(0x1000)).unwrap();
                resource.block(0).unwrap().read_to_end(&mut buffer).unwrap();
                divan::black_box(buffer);
            });
    }

    #[divan::bench(args = [false, true], sample_count = 10)]
    fn read_resource_all(bencher: Bencher, compressed: bool) {
        bencher
            .with_inputs(|| ResourceReader::new(Cursor::new(super::get_input(compressed))).unwrap())
            .bench_local_refs(|res| {
                let mut buffer = Vec::new();
                for id in res.ids() {
                    let resource = res.resource(id).unwrap();
                    for index in 0..resource.block_count() {
                        resource
                            .block(index)
                            .unwrap()
                            .read_to_end(&mut buffer)
                            .unwrap();
                        buffer.clear();
                    }
                }
            });
    }
}

pub mod write {
    use divan::Bencher;
    use ss1_res::ResourceReader;
    use std::io::Cursor;

    #[divan::bench(args = [false, true], sample_count = 10)]
    fn copy_file(bencher: Bencher, compressed: bool) {
        bencher
            .with_inputs(|| ResourceReader::new(Cursor::new(super::get_input(compressed))).unwrap())
            .bench_local_values(|mut res| {
                divan::black_box(ss1_res::write::write(Cursor::new(Vec::new()), &mut res).unwrap());
            });
    }
}
