//! Component G's explicit owner (§4.4, §4.5, §6): one [`Session`] per file
//! owns the z_file-wide context store, the optional reference, the
//! random-access index, and the running digest, and drives one
//! `compress`/`decompress` pass each. Everything the dispatcher's compute
//! closures need is captured as `Arc`-shared, `'static` state rather than
//! borrowed from `self`, since `compute` must be `Send + Sync + 'static` to
//! run on the thread pool; the sequential merge-and-append work that does
//! need exclusive access to `self` happens entirely inside the dispatcher's
//! ordered `write` callback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bgzf::BgzfMeta;
use crate::bitarray::{BitArray, NucArray};
use crate::codec::{assign_best_codec, codec_by_id, general_purpose_candidates, CodecId, SelectedCodec};
use crate::container::{reconstruct, Container, TranslatorTable};
use crate::dict::b250;
use crate::dict::{ContextStore, DictId};
use crate::digest::{DigestKind, DigestValue, RunningDigest};
use crate::error::{GenozipError, Result};
use crate::reference::{compact, RefMode, Range, ReferenceStore};
use crate::segment::fasta::FastaSegmenter;
use crate::segment::fastq::FastqSegmenter;
use crate::segment::gvf::GvfSegmenter;
use crate::segment::me23::Me23Segmenter;
use crate::segment::sam::{self, SamSegmenter};
use crate::segment::vcf::VcfSegmenter;
use crate::segment::{split_lines, Segmenter};
use crate::vb::dispatcher::Dispatcher;
use crate::vb::footer::{Footer, GenozipHeader};
use crate::vb::random_access::{RaEntry, RandomAccessIndex};
use crate::vb::section::{SectionHeader, SectionListEntry, SectionType, SECTION_HEADER_LEN};
use crate::vb::VBlock;

const FORMAT_VERSION: u8 = 1;

/// Which plug-in segmenter a z_file was produced and must be reconstructed
/// with — the "data-type-specific bit" §6 refers to, persisted in
/// [`GenozipHeader::data_type`] so genounzip never needs the caller to
/// already know the source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Vcf,
    Sam,
    Fastq,
    Fasta,
    Gvf,
    Me23,
}

impl Format {
    fn to_u8(self) -> u8 {
        match self {
            Format::Vcf => 0,
            Format::Sam => 1,
            Format::Fastq => 2,
            Format::Fasta => 3,
            Format::Gvf => 4,
            Format::Me23 => 5,
        }
    }

    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => Format::Vcf,
            1 => Format::Sam,
            2 => Format::Fastq,
            3 => Format::Fasta,
            4 => Format::Gvf,
            5 => Format::Me23,
            other => return Err(GenozipError::Other(format!("unknown data type byte {other}"))),
        })
    }

    /// Infers a format from a source filename's extension, for `genozip`
    /// invocations that don't pass `--input-type` explicitly.
    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        Some(match ext.as_str() {
            "vcf" => Format::Vcf,
            "sam" => Format::Sam,
            "fastq" | "fq" => Format::Fastq,
            "fasta" | "fa" | "fna" => Format::Fasta,
            "gff" | "gff3" | "gvf" => Format::Gvf,
            "23andme" | "me23" => Format::Me23,
            _ => return None,
        })
    }
}

fn make_segmenter(format: Format, header: &[u8]) -> Box<dyn Segmenter + Send> {
    match format {
        Format::Vcf => Box::new(VcfSegmenter::new(header)),
        Format::Sam => Box::new(SamSegmenter::default()),
        Format::Fastq => Box::new(FastqSegmenter::default()),
        Format::Fasta => Box::new(FastaSegmenter::default()),
        Format::Gvf => Box::new(GvfSegmenter::default()),
        Format::Me23 => Box::new(Me23Segmenter::default()),
    }
}

/// Splits `data` at the header/body boundary for `format`: VCF's `##`/`#CHROM`
/// preamble, SAM's `@`-lines, GVF's `#`-lines — kept verbatim and re-emitted
/// ahead of the reconstructed body — versus the data lines a segmenter walks.
/// FASTQ/FASTA/23andMe have no format-level header block.
fn split_header_body(format: Format, data: &[u8]) -> (&[u8], &[u8]) {
    if matches!(format, Format::Fastq | Format::Fasta | Format::Me23) {
        return data.split_at(0);
    }
    let mut pos = 0usize;
    while pos < data.len() {
        let line_end = match data[pos..].iter().position(|&b| b == b'\n') {
            Some(p) => pos + p + 1,
            None => data.len(),
        };
        let line = &data[pos..line_end];
        let trimmed = line.strip_suffix(b"\n").unwrap_or(line);
        let is_header = match format {
            Format::Vcf | Format::Gvf => trimmed.starts_with(b"#"),
            Format::Sam => trimmed.starts_with(b"@"),
            _ => false,
        };
        if !is_header {
            break;
        }
        let is_vcf_column_line = format == Format::Vcf && trimmed.starts_with(b"#CHROM");
        pos = line_end;
        if is_vcf_column_line {
            break;
        }
    }
    data.split_at(pos)
}

/// Splits fields the way each format's segmenter does, for the raw-text scan
/// [`extract_ra`] performs independently of any `Ctx` state.
fn split_fields(format: Format, line: &[u8]) -> Vec<&[u8]> {
    match format {
        Format::Me23 => line.split(|&b| b == b' ' || b == b'\t').filter(|f| !f.is_empty()).collect(),
        _ => line.split(|&b| b == b'\t').collect(),
    }
}

/// Scans one VBlock's raw text for the chrom/position range it covers,
/// without going through `Ctx` — a lightweight duplicate of what the
/// segmenter already parses, traded for keeping `extract_ra` out of the
/// `Send + Sync + 'static` compute closure's mutable state. FASTQ/FASTA have
/// no positional data and return `None`.
fn extract_ra(format: Format, vblock_i: u32, chunk: &[u8]) -> Option<RaEntry> {
    let (chrom_idx, pos_idx): (usize, usize) = match format {
        Format::Vcf => (0, 1),
        Format::Sam => (2, 3),
        Format::Me23 => (1, 2),
        Format::Gvf => (0, 3),
        _ => return None,
    };
    let mut chrom: Option<String> = None;
    let mut first_pos = u64::MAX;
    let mut last_pos = 0u64;
    for line in split_lines(chunk) {
        if line.starts_with(b"#") || line.starts_with(b"@") {
            continue;
        }
        let fields = split_fields(format, line);
        if fields.len() <= pos_idx || fields.len() <= chrom_idx {
            continue;
        }
        let Ok(pos) = std::str::from_utf8(fields[pos_idx]).unwrap_or("").parse::<u64>() else {
            continue;
        };
        if chrom.is_none() {
            chrom = Some(String::from_utf8_lossy(fields[chrom_idx]).into_owned());
        }
        first_pos = first_pos.min(pos);
        last_pos = last_pos.max(pos);
    }
    chrom.map(|chrom| RaEntry { vblock_i, chrom, first_pos, last_pos })
}

/// Splits `body` into line-respecting chunks of approximately `vblock_size`
/// bytes each — a VBlock never ends mid-line (§3).
fn split_vblocks(body: &[u8], vblock_size: usize) -> Vec<VBlock> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    let mut first_line = 0u64;
    let mut vblock_i = 0u32;
    while offset < body.len() {
        let mut end = (offset + vblock_size).min(body.len());
        if end < body.len() {
            end = match body[offset..end].iter().rposition(|&b| b == b'\n') {
                Some(p) => offset + p + 1,
                None => match body[offset..].iter().position(|&b| b == b'\n') {
                    Some(p) => offset + p + 1,
                    None => body.len(),
                },
            };
        }
        let chunk = &body[offset..end];
        let mut vb = VBlock::new(vblock_i, first_line);
        vb.txt_data = chunk.to_vec();
        vb.num_lines = chunk.iter().filter(|&&b| b == b'\n').count() as u64;
        first_line += vb.num_lines;
        vblock_i += 1;
        offset = end;
        out.push(vb);
    }
    out
}

/// One VBlock's contribution once segmentation finishes (§4.5), handed from
/// a compute closure to the dispatcher's ordered `write` callback.
struct VbZipResult {
    local: ContextStore,
    repeats: u32,
    ra_entry: Option<RaEntry>,
    txt_data: Vec<u8>,
}

/// Owns everything that persists across one ZIP or PIZ pass: the z_file-wide
/// context store, the optional reference, the random-access index, and the
/// running digest. Callers construct one `Session` per `.genozip` archive.
pub struct Session {
    pub global: ContextStore,
    pub reference: Option<Arc<ReferenceStore>>,
    pub ra_index: RandomAccessIndex,
    pub digest: RunningDigest,
    pub translators: TranslatorTable,
    /// Set by the caller when the source file was unwrapped from BGZF before
    /// segmentation (§4.3), so `serialize` can persist the level/boundary
    /// metadata needed to re-wrap the reconstructed text bit-exactly.
    bgzf_meta: Option<BgzfMeta>,
    nb_threads: usize,
    vblock_size: usize,
    fast_mode: bool,
}

impl Session {
    pub fn new(digest_kind: DigestKind) -> Self {
        Session {
            global: ContextStore::default(),
            reference: None,
            ra_index: RandomAccessIndex::new(),
            digest: RunningDigest::new(digest_kind),
            translators: TranslatorTable::default(),
            bgzf_meta: None,
            nb_threads: crate::config::nb_workers_default(),
            vblock_size: crate::config::VBLOCK_MEMORY_DEFAULT,
            fast_mode: false,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceStore) -> Self {
        self.reference = Some(Arc::new(reference));
        self
    }

    pub fn with_vblock_size(mut self, size: usize) -> Self {
        self.vblock_size = size.clamp(crate::config::VBLOCK_MEMORY_MIN, crate::config::VBLOCK_MEMORY_MAX);
        self
    }

    pub fn with_threads(mut self, nb_threads: usize) -> Self {
        self.nb_threads = nb_threads.clamp(1, crate::config::NB_WORKERS_MAX);
        self
    }

    pub fn with_fast_mode(mut self, fast: bool) -> Self {
        self.fast_mode = fast;
        self
    }

    /// Records the BGZF level/boundary metadata for the source file a
    /// caller already unwrapped before calling `compress` (§4.3), so the
    /// archive can re-wrap its reconstructed text bit-exactly on decompress.
    pub fn with_bgzf_meta(mut self, meta: BgzfMeta) -> Self {
        self.bgzf_meta = Some(meta);
        self
    }

    /// ZIP: segments `data` (a complete in-memory text file) under `format`
    /// into VBlocks, dispatches them across the thread pool, merges each
    /// VBlock's local contexts into `self.global` in ascending order, and
    /// serializes the resulting z_file to bytes.
    pub fn compress(&mut self, format: Format, data: &[u8]) -> Result<Vec<u8>> {
        let (header, body) = split_header_body(format, data);
        let header = header.to_vec();
        // Digest covers the whole reconstructed text (header + body, in that
        // order) so it matches what `decompress` re-hashes; body bytes are
        // folded in per-VBlock inside the dispatcher's ordered write below.
        self.digest.update(&header);

        let mut template_seg = make_segmenter(format, &header);
        let container_template = template_seg.initialize(&mut self.global);

        let vblocks = split_vblocks(body, self.vblock_size);
        let num_vblocks = vblocks.len() as u32;

        let dispatcher = Dispatcher::new(self.nb_threads, self.nb_threads)
            .ok_or_else(|| GenozipError::Other("failed to start compute thread pool".into()))?;

        let header_for_compute = Arc::new(header.clone());
        let global_snapshot = Arc::new(self.global.deep_clone_for_vb());
        let reference = self.reference.clone();

        let compute = move |vb: VBlock| -> Result<VbZipResult> {
            let mut local = global_snapshot.deep_clone_for_vb();
            let mut seg = make_segmenter(format, &header_for_compute);
            seg.initialize(&mut local);
            for line in split_lines(&vb.txt_data) {
                seg.seg_line(&mut local, reference.as_deref(), line)?;
            }
            seg.finalize(&mut local);
            let ra_entry = extract_ra(format, vb.vblock_i, &vb.txt_data);
            Ok(VbZipResult { repeats: seg.num_repeats(), local, ra_entry, txt_data: vb.txt_data })
        };

        let mut total_repeats = 0u32;
        let global = &mut self.global;
        let ra_index = &self.ra_index;
        let digest = &mut self.digest;

        dispatcher.run(vblocks.into_iter(), compute, |vb_result: VbZipResult| -> Result<()> {
            digest.update(&vb_result.txt_data);
            if let Some(ra) = vb_result.ra_entry {
                ra_index.push(ra);
            }
            total_repeats += vb_result.repeats;
            for ctx in vb_result.local.iter_in_order() {
                let translation = global.merge_vb_context(ctx.dict_id, ctx.name, ctx);
                global
                    .get_mut(ctx.dict_id)
                    .expect("context was just created by merge_vb_context")
                    .append_translated_b250(&ctx.b250, &translation);
            }
            Ok(())
        })?;

        let container = Container::new(container_template.dict_id, total_repeats, container_template.items);
        let digest_value = self.digest.snapshot();

        self.serialize(format, &header, &container, data.len() as u64, num_vblocks, digest_value)
    }

    /// PIZ: parses a serialized z_file, reconstructs the body by walking its
    /// toplevel container, prepends the format header, and verifies the
    /// reconstructed text's digest against the one recorded at ZIP time
    /// (§4.4's "digest verification on decompress").
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.decompress_inner(data)?.0)
    }

    /// Decompresses a 23andMe archive and rewrites each row as a VCF data
    /// line against `self.reference` (§8 scenario 5) — the reconstruct path
    /// itself just replays the original 23andMe rows, so callers that want
    /// the VCF view go through this method instead of plain `decompress`.
    pub fn decompress_me23_as_vcf(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let (restored, format) = self.decompress_inner(data)?;
        if format != Format::Me23 {
            return Err(GenozipError::Other("decompress_me23_as_vcf: archive is not a 23andMe data type".into()));
        }
        let reference = self
            .reference
            .clone()
            .ok_or_else(|| GenozipError::Other("translating 23andMe to VCF requires --reference to resolve REF bases".into()))?;

        let mut out = b"##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n".to_vec();
        for line in split_lines(&restored) {
            if line.starts_with(b"#") {
                continue;
            }
            let fields: Vec<&[u8]> = line.split(|&b| b == b' ' || b == b'\t').filter(|f| !f.is_empty()).collect();
            if fields.len() < 4 {
                continue;
            }
            let rsid = String::from_utf8_lossy(fields[0]).into_owned();
            let chrom = String::from_utf8_lossy(fields[1]).into_owned();
            let pos: u64 = std::str::from_utf8(fields[2])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| GenozipError::Other(format!("bad 23andMe position {:?}", String::from_utf8_lossy(fields[2]))))?;
            let genotype = fields[3];

            let range_arc =
                reference.get_range(&chrom).ok_or_else(|| GenozipError::Other(format!("reference has no contig {chrom}")))?;
            let ref_base = {
                let range = range_arc.read().unwrap();
                range
                    .get_base((pos - 1) as usize)
                    .map_err(|_| GenozipError::Other(format!("position {pos} out of range on {chrom}")))?
                    .ok_or_else(|| GenozipError::Other(format!("reference base unset at {chrom}:{pos}")))?
            };

            out.extend_from_slice(&crate::segment::me23::translate_row(&rsid, &chrom, pos, genotype, ref_base)?);
            out.push(b'\n');
        }
        Ok(out)
    }

    fn decompress_inner(&mut self, data: &[u8]) -> Result<(Vec<u8>, Format)> {
        let footer = Footer::read_from(&mut &data[data.len() - 8..])?;
        let list_start = footer.section_list_offset as usize;
        let list_bytes = &data[list_start..data.len() - 8];
        const ENTRY_LEN: usize = 21;
        if list_bytes.len() % ENTRY_LEN != 0 {
            return Err(GenozipError::Other("corrupt section list".into()));
        }
        let mut entries = Vec::with_capacity(list_bytes.len() / ENTRY_LEN);
        let mut cursor = list_bytes;
        while !cursor.is_empty() {
            entries.push(SectionListEntry::read_from(&mut cursor)?);
        }

        let read_section = |offset: usize| -> Result<Vec<u8>> {
            let mut r = &data[offset..];
            let header = SectionHeader::read_from(&mut r)?;
            let body_start = offset + SECTION_HEADER_LEN;
            let body = &data[body_start..body_start + header.compressed_len as usize];
            if header.uncompressed_len == 0 {
                Ok(Vec::new())
            } else {
                Ok(codec_by_id(header.codec).decompress(body, header.uncompressed_len as usize)?)
            }
        };

        let gh_entry = entries
            .iter()
            .find(|e| e.section_type == SectionType::GenozipHeader)
            .ok_or_else(|| GenozipError::Other("missing genozip header section".into()))?;
        let gh = GenozipHeader::read_from(&mut &data[gh_entry.offset as usize..])?;
        let format = Format::from_u8(gh.data_type)?;

        let header_entry = entries
            .iter()
            .find(|e| e.section_type == SectionType::TxtHeader)
            .ok_or_else(|| GenozipError::Other("missing txt header section".into()))?;
        let header_text = read_section(header_entry.offset as usize)?;

        let container_entry = entries
            .iter()
            .find(|e| e.section_type == SectionType::VbHeader)
            .ok_or_else(|| GenozipError::Other("missing container template section".into()))?;
        let container_bytes = read_section(container_entry.offset as usize)?;
        let container = Container::from_bytes(&container_bytes)?;

        let mut piz_store = ContextStore::default();
        for entry in entries.iter().filter(|e| e.section_type == SectionType::Dictionary) {
            let dict_bytes = read_section(entry.offset as usize)?;
            let name: &'static str = Box::leak(format!("dict_{:#x}", entry.dict_id).into_boxed_str());
            let ctx = piz_store.get_or_create(DictId(entry.dict_id), name);
            ctx.nodes = dict_bytes.split(|&b| b == b'\t').filter(|s| !s.is_empty()).map(|s| s.to_vec()).collect();
            ctx.dict = dict_bytes;
        }
        for entry in entries.iter().filter(|e| e.section_type == SectionType::B250) {
            let b250_bytes = read_section(entry.offset as usize)?;
            let name: &'static str = Box::leak(format!("dict_{:#x}", entry.dict_id).into_boxed_str());
            let ctx = piz_store.get_or_create(DictId(entry.dict_id), name);
            ctx.b250 = b250::decode_stream(&b250_bytes);
        }

        self.load_reference_sections(&entries, &read_section)?;
        if format == Format::Sam && self.translators.is_empty() {
            self.translators.register(Box::new(sam::SamSeqTranslator::new(self.reference.clone())));
        }

        let body = reconstruct(&container, &mut piz_store, Some(&self.translators), None)?;

        let mut full = header_text;
        full.extend_from_slice(&body);

        let expected = DigestValue::from_header_bytes(gh.digest_kind, gh.digest_bytes)
            .ok_or_else(|| GenozipError::Other("unknown digest kind in archive header".into()))?;
        let mut check = RunningDigest::new(expected.kind());
        check.update(&full);
        if check.snapshot() != expected {
            return Err(GenozipError::Digest("reconstructed text does not match archive digest"));
        }

        if let Some(entry) = entries.iter().find(|e| e.section_type == SectionType::Bgzf) {
            let meta_bytes = read_section(entry.offset as usize)?;
            let meta = BgzfMeta::from_bytes(&meta_bytes)
                .ok_or_else(|| GenozipError::Other("corrupt BGZF metadata section".into()))?;
            full = meta.rewrap(&full)?;
        }

        Ok((full, format))
    }

    /// Reconstructs `self.reference` from `Reference`/`RefIsSet` section
    /// pairs embedded in the archive (§4.2 REF_EXT_STORE persistence), if
    /// any exist and no reference was already supplied via `--reference`
    /// (an explicit CLI reference always wins over an embedded one).
    fn load_reference_sections(
        &mut self,
        entries: &[SectionListEntry],
        read_section: &impl Fn(usize) -> Result<Vec<u8>>,
    ) -> Result<()> {
        let mut genomes: HashMap<u64, Vec<u8>> = HashMap::new();
        let mut is_sets: HashMap<u64, Vec<u8>> = HashMap::new();
        for entry in entries.iter().filter(|e| e.section_type == SectionType::Reference) {
            genomes.insert(entry.dict_id, read_section(entry.offset as usize)?);
        }
        for entry in entries.iter().filter(|e| e.section_type == SectionType::RefIsSet) {
            is_sets.insert(entry.dict_id, read_section(entry.offset as usize)?);
        }
        if genomes.is_empty() || self.reference.is_some() {
            return Ok(());
        }
        let mut store = ReferenceStore::new(RefMode::Stored);
        for (dict_id, payload) in &genomes {
            if payload.len() < 2 {
                continue;
            }
            let name_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
            if payload.len() < 2 + name_len {
                continue;
            }
            let chrom = String::from_utf8_lossy(&payload[2..2 + name_len]).into_owned();
            let genome = NucArray::from_bytes(&payload[2 + name_len..]);
            let is_set = is_sets.get(dict_id).map(|b| BitArray::from_bytes(b)).unwrap_or_else(|| BitArray::new(genome.len()));
            store.add_prebuilt_range(chrom.clone(), Range::from_parts(chrom, genome, is_set));
        }
        self.reference = Some(Arc::new(store));
        Ok(())
    }

    fn serialize(
        &self,
        format: Format,
        header: &[u8],
        container: &Container,
        source_size: u64,
        num_vblocks: u32,
        digest_value: DigestValue,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut list = Vec::new();

        push_section(&mut out, &mut list, SectionType::TxtHeader, 0, 0, header, self.fast_mode)?;

        let container_bytes = container.to_bytes();
        push_section(&mut out, &mut list, SectionType::VbHeader, container.dict_id.0, 0, &container_bytes, self.fast_mode)?;

        for ctx in self.global.iter_in_order() {
            push_section(&mut out, &mut list, SectionType::Dictionary, ctx.dict_id.0, 0, &ctx.dict, self.fast_mode)?;
            let b250_bytes = b250::encode_stream(&ctx.b250);
            push_section(&mut out, &mut list, SectionType::B250, ctx.dict_id.0, 0, &b250_bytes, self.fast_mode)?;
        }

        let ra_bytes = encode_ra_entries(&self.ra_index.snapshot_sorted());
        push_section(&mut out, &mut list, SectionType::RandomAccess, 0, 0, &ra_bytes, self.fast_mode)?;

        if let Some(meta) = &self.bgzf_meta {
            let meta_bytes = meta.to_bytes();
            push_section(&mut out, &mut list, SectionType::Bgzf, 0, 0, &meta_bytes, self.fast_mode)?;
        }

        if let Some(reference) = &self.reference {
            // RefMode::External stays read-only against the caller's FASTA
            // and is never embedded; ExtStore/Stored/Internal are the modes
            // §4.2 defines as needing archival independence.
            if matches!(reference.mode, RefMode::ExtStore | RefMode::Stored | RefMode::Internal) {
                for chrom in reference.contigs() {
                    let range_arc = reference.get_range(chrom).expect("contig listed in order but missing its range");
                    let range = range_arc.read().unwrap();
                    let is_set_bytes = match reference.mode {
                        RefMode::ExtStore => {
                            let verbatim_arc =
                                reference.get_verbatim(chrom).expect("contig listed in order but missing its verbatim bitmap");
                            let verbatim = verbatim_arc.read().unwrap();
                            compact::compact_contig(&range.is_set, &verbatim).0.to_bytes()
                        }
                        _ => range.is_set.to_bytes(),
                    };
                    let chrom_bytes = chrom.as_bytes();
                    let mut genome_payload = Vec::with_capacity(2 + chrom_bytes.len() + range.genome.to_bytes().len());
                    genome_payload.extend_from_slice(&(chrom_bytes.len() as u16).to_be_bytes());
                    genome_payload.extend_from_slice(chrom_bytes);
                    genome_payload.extend_from_slice(&range.genome.to_bytes());

                    let dict_id = DictId::from_name(chrom).0;
                    push_section(&mut out, &mut list, SectionType::Reference, dict_id, 0, &genome_payload, self.fast_mode)?;
                    push_section(&mut out, &mut list, SectionType::RefIsSet, dict_id, 0, &is_set_bytes, self.fast_mode)?;
                }
            }
        }

        let (digest_kind, digest_bytes) = digest_value.to_header_bytes();
        let gh_offset = out.len() as u64;
        let gh = GenozipHeader {
            version: FORMAT_VERSION,
            num_vblocks,
            source_size,
            digest_kind,
            digest_bytes,
            data_type: format.to_u8(),
        };
        gh.write_to(&mut out)?;
        list.push(SectionListEntry { offset: gh_offset, section_type: SectionType::GenozipHeader, vblock_i: 0, dict_id: 0 });

        let list_offset = out.len() as u32;
        for entry in &list {
            entry.write_to(&mut out)?;
        }

        Footer { section_list_offset: list_offset }.write_to(&mut out)?;
        Ok(out)
    }
}

/// Writes one section (header + compressed payload) to `out`, recording a
/// matching [`SectionListEntry`]. Empty payloads skip the codec race
/// entirely and are stored as `CodecId::None` with zero compressed bytes.
fn push_section(
    out: &mut Vec<u8>,
    list: &mut Vec<SectionListEntry>,
    section_type: SectionType,
    dict_id: u64,
    vblock_i: u32,
    payload: &[u8],
    fast_mode: bool,
) -> Result<()> {
    let selected = if payload.is_empty() {
        SelectedCodec { id: CodecId::None, compressed: Vec::new() }
    } else {
        let candidates = general_purpose_candidates();
        assign_best_codec(payload, &candidates, fast_mode)?
    };
    let offset = out.len() as u64;
    let header = SectionHeader {
        section_type,
        codec: selected.id,
        flags: 0,
        vblock_i,
        dict_id,
        compressed_len: selected.compressed.len() as u32,
        uncompressed_len: payload.len() as u32,
    };
    header.write_to(out)?;
    out.extend_from_slice(&selected.compressed);
    list.push(SectionListEntry { offset, section_type, vblock_i, dict_id });
    Ok(())
}

/// Flat serialization for the `RandomAccess` section: one record per entry,
/// `vblock_i`(4) `first_pos`(8) `last_pos`(8) `chrom_len`(2) `chrom bytes`.
fn encode_ra_entries(entries: &[RaEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for e in entries {
        out.extend_from_slice(&e.vblock_i.to_be_bytes());
        out.extend_from_slice(&e.first_pos.to_be_bytes());
        out.extend_from_slice(&e.last_pos.to_be_bytes());
        let chrom_bytes = e.chrom.as_bytes();
        out.extend_from_slice(&(chrom_bytes.len() as u16).to_be_bytes());
        out.extend_from_slice(chrom_bytes);
    }
    out
}

#[allow(dead_code)]
fn decode_ra_entries(data: &[u8]) -> Vec<RaEntry> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 22 <= data.len() {
        let vblock_i = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap());
        let first_pos = u64::from_be_bytes(data[pos + 4..pos + 12].try_into().unwrap());
        let last_pos = u64::from_be_bytes(data[pos + 12..pos + 20].try_into().unwrap());
        let chrom_len = u16::from_be_bytes(data[pos + 20..pos + 22].try_into().unwrap()) as usize;
        let chrom_start = pos + 22;
        let chrom = String::from_utf8_lossy(&data[chrom_start..chrom_start + chrom_len]).into_owned();
        out.push(RaEntry { vblock_i, chrom, first_pos, last_pos });
        pos = chrom_start + chrom_len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const VCF_HEADER: &[u8] = b"##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\n";

    fn vcf_file() -> Vec<u8> {
        let mut data = VCF_HEADER.to_vec();
        data.extend_from_slice(b"chr1\t100\t.\tA\tC\t20\tPASS\t.\tGT\n");
        data.extend_from_slice(b"chr1\t101\t.\tA\tG\t20\tPASS\t.\tGT\n");
        data.extend_from_slice(b"chr1\t102\t.\tA\tT\t20\tPASS\t.\tGT\n");
        data
    }

    #[test]
    fn split_header_body_keeps_vcf_preamble_through_chrom_line() {
        let data = vcf_file();
        let (header, body) = split_header_body(Format::Vcf, &data);
        assert_eq!(header, VCF_HEADER);
        assert!(body.starts_with(b"chr1\t100"));
    }

    #[test]
    fn split_header_body_fastq_has_no_header() {
        let data = b"@read1\nACGT\n+\nIIII\n";
        let (header, body) = split_header_body(Format::Fastq, data);
        assert!(header.is_empty());
        assert_eq!(body, data);
    }

    #[test]
    fn split_vblocks_never_breaks_a_line() {
        let body = b"line one\nline two\nline three\n";
        let vblocks = split_vblocks(body, 12);
        let mut rejoined = Vec::new();
        for vb in &vblocks {
            assert!(vb.txt_data.ends_with(b"\n") || vb.txt_data.is_empty());
            rejoined.extend_from_slice(&vb.txt_data);
        }
        assert_eq!(rejoined, body);
        assert!(vblocks.len() > 1);
    }

    #[test]
    fn extract_ra_reads_vcf_position_range() {
        let chunk = b"chr1\t100\t.\tA\tC\nchr1\t250\t.\tA\tG\n";
        let ra = extract_ra(Format::Vcf, 0, chunk).unwrap();
        assert_eq!(ra.chrom, "chr1");
        assert_eq!(ra.first_pos, 100);
        assert_eq!(ra.last_pos, 250);
    }

    #[test]
    fn extract_ra_none_for_fasta() {
        assert!(extract_ra(Format::Fasta, 0, b">chr1\nACGT\n").is_none());
    }

    #[test]
    fn ra_entries_roundtrip() {
        let entries = vec![
            RaEntry { vblock_i: 0, chrom: "chr1".into(), first_pos: 1, last_pos: 100 },
            RaEntry { vblock_i: 1, chrom: "chr2".into(), first_pos: 5, last_pos: 9 },
        ];
        let bytes = encode_ra_entries(&entries);
        assert_eq!(decode_ra_entries(&bytes), entries);
    }

    #[test]
    fn compress_then_decompress_round_trips_vcf_byte_identical() {
        let data = vcf_file();
        let mut zip_session = Session::new(DigestKind::Adler32).with_threads(2);
        let archive = zip_session.compress(Format::Vcf, &data).unwrap();

        let mut unzip_session = Session::new(DigestKind::Adler32);
        let restored = unzip_session.decompress(&archive).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn compress_then_decompress_round_trips_fastq() {
        let data = b"@read1\nACGTACGTAC\n+\nIIIIIIIIII\n@read2\nTTTTGGGGCC\n+\nIIIIIIIIII\n".to_vec();
        let mut zip_session = Session::new(DigestKind::Md5).with_threads(1);
        let archive = zip_session.compress(Format::Fastq, &data).unwrap();

        let mut unzip_session = Session::new(DigestKind::Md5);
        let restored = unzip_session.decompress(&archive).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn decompress_rejects_tampered_archive() {
        let data = vcf_file();
        let mut zip_session = Session::new(DigestKind::Adler32);
        let mut archive = zip_session.compress(Format::Vcf, &data).unwrap();
        // Flip a byte inside the txt header section's payload.
        let flip_at = SECTION_HEADER_LEN;
        archive[flip_at] ^= 0xff;

        let mut unzip_session = Session::new(DigestKind::Adler32);
        assert!(unzip_session.decompress(&archive).is_err());
    }

    #[test]
    fn random_access_index_populated_after_compress() {
        let data = vcf_file();
        let mut session = Session::new(DigestKind::Adler32).with_vblock_size(crate::config::VBLOCK_MEMORY_MIN);
        session.compress(Format::Vcf, &data).unwrap();
        assert!(!session.ra_index.is_empty());
        let hits = session.ra_index.lookup("chr1", 100, 102);
        assert!(!hits.is_empty());
    }
}
