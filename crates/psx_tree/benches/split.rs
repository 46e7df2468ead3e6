use divan::AllocProfiler;

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

fn main() {
    divan::main();
}

pub mod split {
    use divan::Bencher;
    use psx_tree::checksum;
    use psx_tree::codec::SECTOR_SIZE;
    use psx_tree::{DataType, FileFormat, FileTree};

    const MEMBERS: usize = 256;

    #[rustfmt::skip]
    fn tim() -> Vec<u8> {
        vec![
            0x10, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00,
            0x10, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x02, 0x00,
            0xFF, 0x7F, 0xFF, 0x7F,
        ]
    }

    fn sizeless_mix() -> Vec<u8> {
        tim().repeat(MEMBERS)
    }

    fn t_file() -> Vec<u8> {
        let mut data = Vec::with_capacity((MEMBERS + 1) * SECTOR_SIZE);
        data.extend((MEMBERS as u16).to_le_bytes());
        for sector in 1..=MEMBERS as u16 + 1 {
            data.extend(sector.to_le_bytes());
        }
        data.resize(SECTOR_SIZE, 0);

        for index in 0..MEMBERS {
            let mut member = vec![index as u8; SECTOR_SIZE];
            checksum::recalculate(&mut member);
            data.extend(member);
        }
        data
    }

    fn load(format: FileFormat, data: Vec<u8>) -> FileTree {
        let mut tree = FileTree::new();
        tree.add_node(tree.root(), "BENCH", format, DataType::Container, data)
            .unwrap();
        tree
    }

    #[divan::bench]
    fn decode_sizeless(bencher: Bencher) {
        bencher.with_inputs(sizeless_mix).bench_values(|data| {
            divan::black_box(load(FileFormat::Mix, data));
        });
    }

    #[divan::bench]
    fn decode_t(bencher: Bencher) {
        bencher.with_inputs(t_file).bench_values(|data| {
            divan::black_box(load(FileFormat::T, data));
        });
    }

    #[divan::bench]
    fn encode_t(bencher: Bencher) {
        let tree = load(FileFormat::T, t_file());
        let id = tree.resolve("BENCH").unwrap();
        bencher.bench_local(move || {
            divan::black_box(tree.serialize(id).unwrap());
        });
    }
}
