//! Translation of `Command` into wire argument vectors

use sugar_core::{format_score, Command};

struct Args(Vec<Vec<u8>>);

impl Args {
    fn new(name: &str) -> Self {
        Args(vec![name.as_bytes().to_vec()])
    }

    fn push(&mut self, arg: impl AsRef<[u8]>) -> &mut Self {
        self.0.push(arg.as_ref().to_vec());
        self
    }

    fn push_num(&mut self, n: impl ToString) -> &mut Self {
        self.0.push(n.to_string().into_bytes());
        self
    }

    fn push_all<S: AsRef<[u8]>>(&mut self, items: &[S]) -> &mut Self {
        self.0.extend(items.iter().map(|s| s.as_ref().to_vec()));
        self
    }

    fn push_pairs(&mut self, pairs: &[(String, String)]) -> &mut Self {
        for (a, b) in pairs {
            self.push(a).push(b);
        }
        self
    }
}

/// Argument vector for `command`, name first
pub fn command_args(command: &Command) -> Vec<Vec<u8>> {
    let mut a = Args::new(command.name());
    match command {
        Command::Ping | Command::DbSize | Command::FlushDb | Command::Save | Command::BgSave => {}
        Command::Exists(key)
        | Command::Type(key)
        | Command::Dump(key)
        | Command::Get(key)
        | Command::StrLen(key)
        | Command::LLen(key)
        | Command::LPop(key)
        | Command::RPop(key)
        | Command::HLen(key)
        | Command::HKeys(key)
        | Command::HVals(key)
        | Command::HGetAll(key)
        | Command::SCard(key)
        | Command::SMembers(key)
        | Command::SPop(key)
        | Command::ZCard(key) => {
            a.push(key);
        }
        Command::Del(keys)
        | Command::MGet(keys)
        | Command::SUnion(keys)
        | Command::SInter(keys)
        | Command::SDiff(keys) => {
            a.push_all(keys);
        }
        Command::Rename { src, dst, .. } => {
            a.push(src).push(dst);
        }
        Command::Restore {
            key,
            ttl_ms,
            payload,
            replace,
        } => {
            a.push(key).push_num(ttl_ms).push(payload);
            if *replace {
                a.push("REPLACE");
            }
        }
        Command::Scan {
            cursor,
            pattern,
            count,
        } => {
            a.push_num(cursor);
            if let Some(p) = pattern {
                a.push("MATCH").push(p);
            }
            if let Some(c) = count {
                a.push("COUNT").push_num(c);
            }
        }
        Command::Set {
            key,
            value,
            options,
        } => {
            a.push(key).push(value);
            if let Some(ex) = options.ex {
                a.push("EX").push_num(ex);
            }
            if let Some(px) = options.px {
                a.push("PX").push_num(px);
            }
            if options.nx {
                a.push("NX");
            }
            if options.xx {
                a.push("XX");
            }
        }
        Command::GetSet { key, value } | Command::Append { key, value } => {
            a.push(key).push(value);
        }
        Command::GetRange { key, start, end } => {
            a.push(key).push_num(start).push_num(end);
        }
        Command::SetRange { key, offset, value } => {
            a.push(key).push_num(offset).push(value);
        }
        Command::IncrBy { key, delta } => {
            a.push(key).push_num(delta);
        }
        Command::IncrByFloat { key, delta } => {
            a.push(key).push(format_score(*delta));
        }
        Command::MSet(pairs) | Command::MSetNx(pairs) => {
            a.push_pairs(pairs);
        }
        Command::LPush { key, values } | Command::RPush { key, values } => {
            a.push(key).push_all(values);
        }
        Command::LIndex { key, index } => {
            a.push(key).push_num(index);
        }
        Command::LSet { key, index, value } => {
            a.push(key).push_num(index).push(value);
        }
        Command::LRange { key, start, stop }
        | Command::LTrim { key, start, stop }
        | Command::ZRemRangeByRank { key, start, stop } => {
            a.push(key).push_num(start).push_num(stop);
        }
        Command::LInsert {
            key,
            position,
            pivot,
            value,
        } => {
            a.push(key).push(position.keyword()).push(pivot).push(value);
        }
        Command::LRem { key, count, value } => {
            a.push(key).push_num(count).push(value);
        }
        Command::LMove { src, dst, from, to } => {
            a.push(src).push(dst).push(from.keyword()).push(to.keyword());
        }
        Command::Sort {
            key,
            alpha,
            desc,
            store,
        } => {
            a.push(key);
            if *alpha {
                a.push("ALPHA");
            }
            if *desc {
                a.push("DESC");
            }
            if let Some(dest) = store {
                a.push("STORE").push(dest);
            }
        }
        Command::HExists { key, field } | Command::HGet { key, field } => {
            a.push(key).push(field);
        }
        Command::HSet { key, pairs } => {
            a.push(key).push_pairs(pairs);
        }
        Command::HDel { key, fields } | Command::HMGet { key, fields } => {
            a.push(key).push_all(fields);
        }
        Command::HScan { key, cursor, count }
        | Command::SScan { key, cursor, count } => {
            a.push(key).push_num(cursor);
            if let Some(c) = count {
                a.push("COUNT").push_num(c);
            }
        }
        Command::HIncrBy { key, field, delta } => {
            a.push(key).push(field).push_num(delta);
        }
        Command::HIncrByFloat { key, field, delta } => {
            a.push(key).push(field).push(format_score(*delta));
        }
        Command::SIsMember { key, member } | Command::ZScore { key, member } => {
            a.push(key).push(member);
        }
        Command::ZRank { key, member, .. } => {
            a.push(key).push(member);
        }
        Command::SAdd { key, members }
        | Command::SRem { key, members }
        | Command::ZRem { key, members } => {
            a.push(key).push_all(members);
        }
        Command::SUnionStore { dest, keys }
        | Command::SInterStore { dest, keys }
        | Command::SDiffStore { dest, keys } => {
            a.push(dest).push_all(keys);
        }
        Command::ZAdd { key, entries } => {
            a.push(key);
            for (score, member) in entries {
                a.push(format_score(*score)).push(member);
            }
        }
        Command::ZIncrBy { key, delta, member } => {
            a.push(key).push(format_score(*delta)).push(member);
        }
        Command::ZCount { key, min, max } | Command::ZRemRangeByScore { key, min, max } => {
            a.push(key).push(min.to_string()).push(max.to_string());
        }
        Command::ZRange {
            key,
            start,
            stop,
            with_scores,
            ..
        } => {
            a.push(key).push_num(start).push_num(stop);
            if *with_scores {
                a.push("WITHSCORES");
            }
        }
        Command::ZRangeByScore {
            key,
            min,
            max,
            limit,
            rev,
            with_scores,
        } => {
            a.push(key);
            // ZREVRANGEBYSCORE takes max before min
            if *rev {
                a.push(max.to_string()).push(min.to_string());
            } else {
                a.push(min.to_string()).push(max.to_string());
            }
            if *with_scores {
                a.push("WITHSCORES");
            }
            if let Some((offset, count)) = limit {
                a.push("LIMIT").push_num(offset).push_num(count);
            }
        }
        Command::ZUnionStore {
            dest,
            keys,
            weights,
            aggregate,
        }
        | Command::ZInterStore {
            dest,
            keys,
            weights,
            aggregate,
        } => {
            a.push(dest).push_num(keys.len()).push_all(keys);
            if let Some(w) = weights {
                a.push("WEIGHTS");
                for weight in w {
                    a.push(format_score(*weight));
                }
            }
            a.push("AGGREGATE").push(aggregate.keyword());
        }
    }
    a.0
}
